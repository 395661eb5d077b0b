//! # Driftwave Common Library
//!
//! Shared code for the Driftwave playback facade:
//! - Error types (`Error` enum, `Result` alias)
//! - Asset metadata and playback state vocabulary
//! - Event types (`EventKind`, `PlayerEvent`) and the per-instance `EventEmitter`
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod metadata;

pub use config::{CapabilityProfile, PlayerConfig};
pub use error::{Error, Result};
pub use events::{EventEmitter, EventKind, ListenerId, Listeners, PlayerEvent};
pub use metadata::{Metadata, PlaybackState};
