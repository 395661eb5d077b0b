//! # Driftwave Player Library
//!
//! Client-side control facade for loading and playing one audio asset.
//!
//! **Purpose:** Present a small event-driven API (`load`, `play`, `play_from`,
//! `play_range`, `pause`, `is_playing`, `metadata`) over an engine capability
//! that does the actual decoding and rendering.
//!
//! **Architecture:**
//! - [`engine`]: the engine capability seam (`AudioEngine`, `StagedEngine`,
//!   `EngineFactory`), the exclusively-owned `EngineHandle`, and the
//!   `HeadlessEngine` reference implementation
//! - [`loader`]: load orchestration (delegated or staged fetch/decode/adopt)
//! - [`playback`]: the `Player` facade and its state machine
//! - [`audio`]: symphonia-based decoding used by the headless engine

pub mod audio;
pub mod engine;
pub mod loader;
pub mod playback;

pub use driftwave_common::{
    CapabilityProfile, Error, EventEmitter, EventKind, ListenerId, Listeners, Metadata,
    PlaybackState, PlayerConfig, PlayerEvent, Result,
};
pub use engine::{
    AudioEngine, Clock, EngineFactory, EngineHandle, EngineSignal, HeadlessEngine,
    HeadlessEngineFactory, ManualClock, StagedEngine, SystemClock,
};
pub use loader::{AssetLoader, AutoSource, ByteSource, DelegatedLoader, StagedLoader};
pub use playback::{CallOutcome, IgnoreReason, Player};
