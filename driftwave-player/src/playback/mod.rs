//! Playback facade
//!
//! [`Player`] owns the engine handle, the lifecycle state and the event
//! emitter. Transport commands report a [`CallOutcome`] instead of failing;
//! only `create` and `load` return errors.

mod facade;
mod outcome;

pub use facade::Player;
pub use outcome::{CallOutcome, IgnoreReason};
