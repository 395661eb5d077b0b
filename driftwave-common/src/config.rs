//! Configuration loading and config file resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line argument (`--config <path>`)
//! 2. Environment variable (`DRIFTWAVE_CONFIG`)
//! 3. Per-user TOML file (`<config_dir>/driftwave/config.toml`)
//! 4. Built-in defaults
//!
//! An explicitly named file (CLI or environment) must exist. The per-user file
//! is optional. Every field in the file is optional and falls back to its
//! built-in default.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DRIFTWAVE_CONFIG";

/// Operation surface a facade exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityProfile {
    /// Every playback operation is live
    #[default]
    Full,
    /// Reduced surface: `create`, `load`, `play` and the `ready` event only
    Legacy,
}

/// Facade configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Operation surface
    pub profile: CapabilityProfile,

    /// Upper bound on a single load (fetch + decode + adopt), if any
    pub load_timeout_ms: Option<u64>,

    /// Frames between engine progress reports
    pub progress_interval_frames: u64,

    /// Broadcast channel capacity for async event subscribers
    pub event_channel_capacity: usize,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            profile: CapabilityProfile::Full,
            load_timeout_ms: None,
            progress_interval_frames: default_progress_interval(),
            event_channel_capacity: default_channel_capacity(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_progress_interval() -> u64 {
    4096
}

fn default_channel_capacity() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PlayerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PlayerConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Resolve and load configuration following the priority order above
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        Self::load_with_source(cli_path).map(|(config, _)| config)
    }

    /// Like [`PlayerConfig::load`], also reporting where the values came from
    ///
    /// Callers that install logging from the loaded config use the returned
    /// source to log the resolution once the subscriber exists.
    pub fn load_with_source(cli_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let source = resolve_config_path(cli_path);
        let config = match &source {
            ConfigSource::Explicit(path) | ConfigSource::UserFile(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            ConfigSource::Defaults => {
                debug!("No configuration file found, using built-in defaults");
                Self::default()
            }
        };
        Ok((config, source))
    }

    /// Load timeout as a `Duration`
    pub fn load_timeout(&self) -> Option<std::time::Duration> {
        self.load_timeout_ms.map(std::time::Duration::from_millis)
    }

    fn validate(&self) -> Result<()> {
        if self.progress_interval_frames == 0 {
            return Err(Error::Config(
                "progress_interval_frames must be greater than zero".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::Config(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.load_timeout_ms == Some(0) {
            return Err(Error::Config(
                "load_timeout_ms must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where configuration was resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// CLI argument or environment variable
    Explicit(PathBuf),
    /// Per-user config file that exists on disk
    UserFile(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit(path) => write!(f, "{}", path.display()),
            ConfigSource::UserFile(path) => write!(f, "{} (user config)", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolve the configuration source
pub fn resolve_config_path(cli_path: Option<&Path>) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    if let Some(path) = user_config_file() {
        if path.exists() {
            return ConfigSource::UserFile(path);
        }
    }

    // Priority 4: Built-in defaults
    ConfigSource::Defaults
}

fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("driftwave").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.profile, CapabilityProfile::Full);
        assert_eq!(config.load_timeout_ms, None);
        assert_eq!(config.progress_interval_frames, 4096);
        assert_eq!(config.event_channel_capacity, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = PlayerConfig::from_toml_str(
            r#"
            profile = "legacy"
            load_timeout_ms = 2500

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.profile, CapabilityProfile::Legacy);
        assert_eq!(config.load_timeout(), Some(std::time::Duration::from_millis(2500)));
        assert_eq!(config.progress_interval_frames, 4096);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = PlayerConfig::from_toml_str("progress_interval_frames = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = PlayerConfig::from_toml_str("profile = \"extended\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = PlayerConfig::from_toml_str("load_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[serial]
    fn test_cli_path_takes_priority_over_env() {
        std::env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
        let source = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")));
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(source, ConfigSource::Explicit(PathBuf::from("/tmp/from-cli.toml")));
    }

    #[test]
    #[serial]
    fn test_env_var_used_without_cli() {
        std::env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
        let source = resolve_config_path(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(source, ConfigSource::Explicit(PathBuf::from("/tmp/from-env.toml")));
    }

    #[test]
    #[serial]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftwave.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "progress_interval_frames = 1024").unwrap();

        let config = PlayerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.progress_interval_frames, 1024);
    }

    #[test]
    #[serial]
    fn test_load_reports_resolved_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftwave.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let (config, source) = PlayerConfig::load_with_source(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(source, ConfigSource::Explicit(path.clone()));
        assert_eq!(source.to_string(), path.display().to_string());
        assert_eq!(ConfigSource::Defaults.to_string(), "built-in defaults");
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlayerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
