//! Scripted engine for facade tests
//!
//! Every stage (init, delegated load, decode, adopt) can be told to fail
//! through a shared [`Script`], which tests may edit after the engine has been
//! handed to a facade. The transport is simplified: a started run finishes on
//! the next poll.

use driftwave_player::{
    AudioEngine, ByteSource, EngineFactory, EngineSignal, Error, Metadata, Result, StagedEngine,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SCRIPTED_SAMPLE_RATE: u32 = 44100;
pub const SCRIPTED_FRAMES: u64 = 44100;

/// Failure injection shared between a factory, its engines and the test
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub fail_init: Option<Error>,
    pub fail_load: Option<Error>,
    pub fail_decode: Option<Error>,
    pub fail_adopt: Option<Error>,
}

#[derive(Debug)]
pub struct ScriptedEngine {
    script: Arc<Mutex<Script>>,
    resident: Option<Metadata>,
    playing: bool,
    position: u64,
    stop: u64,
    unloads: usize,
}

impl ScriptedEngine {
    pub fn new(script: Arc<Mutex<Script>>) -> Self {
        Self {
            script,
            resident: None,
            playing: false,
            position: 0,
            stop: 0,
            unloads: 0,
        }
    }

    pub fn has_asset(&self) -> bool {
        self.resident.is_some()
    }

    pub fn unloads(&self) -> usize {
        self.unloads
    }

    fn scripted(&self, pick: impl Fn(&Script) -> Option<Error>) -> Result<()> {
        match pick(&self.script.lock().unwrap()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn frame_count(&self) -> Result<u64> {
        self.resident
            .map(|m| m.frame_count)
            .ok_or_else(|| Error::Playback("no asset loaded".to_string()))
    }

    fn start(&mut self, from: u64, stop: u64) {
        self.position = from;
        self.stop = stop;
        self.playing = true;
    }
}

impl AudioEngine for ScriptedEngine {
    async fn load(&mut self, _url: &str) -> Result<()> {
        self.scripted(|s| s.fail_load.clone())?;
        self.resident = Some(Metadata {
            sample_rate: SCRIPTED_SAMPLE_RATE,
            channel_count: 2,
            frame_count: SCRIPTED_FRAMES,
        });
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let frames = self.frame_count()?;
        let from = if self.position >= frames { 0 } else { self.position };
        self.start(from, frames);
        Ok(())
    }

    fn play_from(&mut self, start_frame: u64) -> Result<()> {
        let frames = self.frame_count()?;
        if start_frame >= frames {
            return Err(Error::Playback(format!("frame {} out of range", start_frame)));
        }
        self.start(start_frame, frames);
        Ok(())
    }

    fn play_range(&mut self, start_frame: u64, end_frame: u64) -> Result<()> {
        let frames = self.frame_count()?;
        if start_frame >= end_frame || start_frame >= frames {
            return Err(Error::InvalidInput(format!(
                "bad range {}..{}",
                start_frame, end_frame
            )));
        }
        self.start(start_frame, end_frame.min(frames));
        Ok(())
    }

    fn pause(&mut self) -> u64 {
        self.playing = false;
        self.position
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn metadata(&self) -> Result<Metadata> {
        self.resident
            .ok_or_else(|| Error::Playback("no asset loaded".to_string()))
    }

    fn poll_signal(&mut self) -> Option<EngineSignal> {
        if !self.playing {
            return None;
        }
        self.playing = false;
        self.position = self.stop;
        Some(EngineSignal::Finished { frame: self.stop })
    }

    fn unload(&mut self) {
        self.resident = None;
        self.playing = false;
        self.position = 0;
        self.unloads += 1;
    }
}

impl StagedEngine for ScriptedEngine {
    /// Decoding yields only the metadata of the would-be buffer
    type Decoded = Metadata;

    async fn decode(&mut self, bytes: Vec<u8>) -> Result<Metadata> {
        self.scripted(|s| s.fail_decode.clone())?;
        Ok(Metadata {
            sample_rate: SCRIPTED_SAMPLE_RATE,
            channel_count: 2,
            frame_count: bytes.len() as u64 / 4,
        })
    }

    async fn adopt(&mut self, decoded: Metadata) -> Result<()> {
        self.scripted(|s| s.fail_adopt.clone())?;
        self.resident = Some(decoded);
        self.position = 0;
        Ok(())
    }
}

/// Builds [`ScriptedEngine`]s sharing one script
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    /// Edit the script seen by already-created engines
    pub fn update(&self, edit: impl FnOnce(&mut Script)) {
        edit(&mut self.script.lock().unwrap());
    }
}

impl EngineFactory for ScriptedFactory {
    type Engine = ScriptedEngine;

    async fn initialize(&self) -> Result<ScriptedEngine> {
        if let Some(err) = self.script.lock().unwrap().fail_init.clone() {
            return Err(err);
        }
        Ok(ScriptedEngine::new(Arc::clone(&self.script)))
    }
}

/// In-memory byte source; unknown locations fail like a missing file
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn with_asset(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(url.to_string(), bytes);
        self
    }
}

impl ByteSource for MemorySource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| Error::fetch(url, "not found"))
    }
}
