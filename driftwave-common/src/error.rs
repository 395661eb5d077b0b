//! Common error types for Driftwave
//!
//! Every variant carries owned strings so a failure value can be cloned:
//! `Player::load` returns it to the caller and the `error` event carries the
//! same value to listeners.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for Driftwave operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the facade, the loader and engine implementations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// Engine capability could not be constructed
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    /// Raw bytes for an asset could not be acquired
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Asset bytes could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Engine refused a decoded buffer
    #[error("Buffer adoption failed: {0}")]
    Adopt(String),

    /// Load did not complete within the configured timeout
    #[error("Load timed out after {0} ms")]
    LoadTimeout(u64),

    /// Engine refused a playback command
    #[error("Playback error: {0}")]
    Playback(String),

    /// Invalid caller-supplied argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a fetch error from any displayable cause
    pub fn fetch(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
