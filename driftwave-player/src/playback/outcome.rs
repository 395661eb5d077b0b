//! Results of facade playback commands

use driftwave_common::Error;

/// Facade operation, used for guard checks and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Play,
    PlayFrom,
    PlayRange,
    Pause,
    IsPlaying,
    Metadata,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Play => write!(f, "play"),
            Operation::PlayFrom => write!(f, "play_from"),
            Operation::PlayRange => write!(f, "play_range"),
            Operation::Pause => write!(f, "pause"),
            Operation::IsPlaying => write!(f, "is_playing"),
            Operation::Metadata => write!(f, "metadata"),
        }
    }
}

/// Why a command was not forwarded to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Engine capability not bound
    EngineAbsent,
    /// No decoded asset is resident
    NoAsset,
    /// `play` while already playing
    AlreadyPlaying,
    /// Operation not part of the configured capability profile
    Unsupported,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreReason::EngineAbsent => write!(f, "engine not initialized"),
            IgnoreReason::NoAsset => write!(f, "no asset loaded"),
            IgnoreReason::AlreadyPlaying => write!(f, "already playing"),
            IgnoreReason::Unsupported => write!(f, "not supported by capability profile"),
        }
    }
}

/// Outcome of `play`, `play_from` and `play_range`
///
/// None of the variants is an error path: an ignored or rejected command
/// leaves the facade state unchanged and emits no event.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Forwarded to the engine; state is now Playing and `play` was emitted
    Applied,
    /// Not forwarded (precondition not met)
    Ignored(IgnoreReason),
    /// Forwarded, but the engine refused (e.g. start frame out of range)
    Rejected(Error),
}

impl CallOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CallOutcome::Applied)
    }
}
