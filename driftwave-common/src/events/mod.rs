//! Event vocabulary for the playback facade
//!
//! Listeners register by [`EventKind`] (or its string name) and receive a
//! [`PlayerEvent`] payload. Events are delivered synchronously by the
//! per-instance [`EventEmitter`], and mirrored onto a broadcast channel for
//! async subscribers.

mod emitter;

pub use emitter::{EmitReport, EventEmitter, Listener, ListenerFailure, ListenerId, Listeners};

use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Event names a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Asset decoded and resident
    Ready,
    /// Playback started or resumed
    Play,
    /// Playback paused
    Pause,
    /// Load failed
    Error,
    /// Periodic transport position from the engine
    Progress,
    /// Engine reached the end of the asset or of the requested range
    Ended,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Ready,
        EventKind::Play,
        EventKind::Pause,
        EventKind::Error,
        EventKind::Progress,
        EventKind::Ended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ready => "ready",
            EventKind::Play => "play",
            EventKind::Pause => "pause",
            EventKind::Error => "error",
            EventKind::Progress => "progress",
            EventKind::Ended => "ended",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown event name '{}'", s)))
    }
}

/// Event payloads delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlayerEvent {
    /// Asset decoded and adopted by the engine (no payload)
    Ready,

    /// Playback started (no payload)
    Play,

    /// Playback paused
    Pause {
        /// Frame at which the engine stopped
        frame: u64,
    },

    /// Load failed; carries the same value `load` returned
    Error { error: Error },

    /// Transport position report
    Progress { frame: u64 },

    /// Transport stopped on its own
    Ended {
        /// Final frame position
        frame: u64,
    },
}

impl PlayerEvent {
    /// The subscription key this payload is delivered under
    pub fn kind(&self) -> EventKind {
        match self {
            PlayerEvent::Ready => EventKind::Ready,
            PlayerEvent::Play => EventKind::Play,
            PlayerEvent::Pause { .. } => EventKind::Pause,
            PlayerEvent::Error { .. } => EventKind::Error,
            PlayerEvent::Progress { .. } => EventKind::Progress,
            PlayerEvent::Ended { .. } => EventKind::Ended,
        }
    }
}
