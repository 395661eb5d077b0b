//! Asset metadata and playback state vocabulary

use serde::{Deserialize, Serialize};

/// Description of a decoded asset
///
/// Produced by the engine once an asset is decoded. Only retrievable while an
/// asset is resident (Ready, Playing or Paused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Samples per second, always positive
    pub sample_rate: u32,
    /// Interleaved channels, always positive
    pub channel_count: u32,
    /// Total frames in the asset
    pub frame_count: u64,
}

impl Metadata {
    /// Asset duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frame_count * 1000 / self.sample_rate as u64
    }
}

/// Facade lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No asset has been loaded yet
    Uninitialized,
    /// A load is in flight
    Loading,
    /// Asset resident, transport stopped
    Ready,
    Playing,
    Paused,
    /// Last load failed; nothing is resident
    Error,
}

impl PlaybackState {
    /// Whether the engine holds a decoded asset in this state
    pub fn has_asset(&self) -> bool {
        matches!(
            self,
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused
        )
    }

    /// Whether `load` may start from this state
    pub fn can_load(&self) -> bool {
        !matches!(self, PlaybackState::Loading)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Uninitialized => write!(f, "uninitialized"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Ready => write!(f, "ready"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Error => write!(f, "error"),
        }
    }
}
