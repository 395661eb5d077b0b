//! Shared fixtures for driftwave-player integration tests
//!
//! - `audio_generator`: deterministic WAV files written with hound
//! - `scripted_engine`: engine and byte source with per-stage failure injection
//! - `event_recorder`: captures every facade event in emission order

#![allow(dead_code)]

pub mod audio_generator;
pub mod event_recorder;
pub mod scripted_engine;

pub use audio_generator::{generate_sine_wav, write_garbage, TestTone};
pub use event_recorder::EventRecorder;
pub use scripted_engine::{MemorySource, Script, ScriptedEngine, ScriptedFactory};
