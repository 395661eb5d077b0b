//! Engine capability seam
//!
//! The facade never decodes or renders audio itself. Everything below the
//! facade goes through these traits:
//!
//! - [`EngineFactory`]: constructs and initializes an engine (the only
//!   fallible step of `Player::create`)
//! - [`AudioEngine`]: the canonical operation set (delegated load, transport
//!   commands, queries, completion signals)
//! - [`StagedEngine`]: the decode/adopt pair used by staged loading
//!
//! Engines are driven from a single logical thread of control. Transport
//! commands are synchronous; only initialization, load, decode and adopt
//! may suspend.

mod clock;
mod handle;
mod headless;

pub use clock::{Clock, ManualClock, SystemClock};
pub use handle::EngineHandle;
pub use headless::{HeadlessEngine, HeadlessEngineFactory};

use driftwave_common::{Metadata, Result};

/// Notification queued by an engine for the facade
///
/// Engines run their transport on their own; these signals are how the facade
/// learns that playback advanced or stopped without a facade call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSignal {
    /// Transport position report
    Progress { frame: u64 },
    /// Transport stopped at the end of the asset or requested range
    Finished { frame: u64 },
}

/// Canonical engine operation set
#[allow(async_fn_in_trait)]
pub trait AudioEngine {
    /// Fetch and decode `url`, replacing any resident asset
    async fn load(&mut self, url: &str) -> Result<()>;

    /// Start or resume from the current position
    fn play(&mut self) -> Result<()>;

    /// Start at `start_frame` (0-based); out-of-range handling is engine-defined
    fn play_from(&mut self, start_frame: u64) -> Result<()>;

    /// Play `[start_frame, end_frame)` and stop without a pause call
    fn play_range(&mut self, start_frame: u64, end_frame: u64) -> Result<()>;

    /// Stop the transport and report the frame it stopped at
    ///
    /// When not playing, reports the last known position.
    fn pause(&mut self) -> u64;

    fn is_playing(&self) -> bool;

    /// Metadata of the resident asset; fails when nothing is decoded
    fn metadata(&self) -> Result<Metadata>;

    /// Next queued notification, if any
    fn poll_signal(&mut self) -> Option<EngineSignal> {
        None
    }

    /// Discard the resident asset and any partially adopted state
    fn unload(&mut self);
}

/// Staged decode/adopt operations
///
/// Used by `StagedLoader`: the loader fetches bytes itself, asks the engine to
/// decode them, then asks it to adopt the decoded buffer as the active one.
#[allow(async_fn_in_trait)]
pub trait StagedEngine: AudioEngine {
    /// Engine-internal decoded representation
    type Decoded;

    /// Decode raw asset bytes
    async fn decode(&mut self, bytes: Vec<u8>) -> Result<Self::Decoded>;

    /// Make `decoded` the active buffer
    async fn adopt(&mut self, decoded: Self::Decoded) -> Result<()>;
}

/// Constructs an initialized engine
#[allow(async_fn_in_trait)]
pub trait EngineFactory {
    type Engine: AudioEngine;

    /// Initialize the engine capability
    ///
    /// Failure is fatal to `Player::create` and is not retried.
    async fn initialize(&self) -> Result<Self::Engine>;
}
