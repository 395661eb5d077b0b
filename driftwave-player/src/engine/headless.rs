//! Headless reference engine
//!
//! Decodes assets with symphonia and runs a clock-driven transport without an
//! audio device. The transport position is derived from elapsed clock time
//! and the asset's sample rate, so range ends and completion are detected
//! whenever the engine is queried or polled.
//!
//! Transport rules:
//! - `play` resumes from the current position; at or past the end of the
//!   asset it restarts from frame 0. A paused range resumes up to its end.
//! - `play_from` plays to the end of the asset.
//! - `play_range(start, end)` stops at `end` (exclusive), clamped to the
//!   asset length.
//! - Reaching the stop frame queues `EngineSignal::Finished`; progress is
//!   queued every `progress_interval_frames`.

use super::{AudioEngine, Clock, EngineFactory, EngineSignal, StagedEngine, SystemClock};
use crate::audio::decoder::{extension_hint, SimpleDecoder};
use crate::audio::DecodedAudio;
use crate::loader::{AutoSource, ByteSource};
use driftwave_common::{Error, Metadata, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_PROGRESS_INTERVAL: u64 = 4096;

#[derive(Debug, Clone, Default)]
struct Transport {
    playing: bool,
    /// Position at `anchor_time`
    anchor_frame: u64,
    anchor_time: Duration,
    /// Exclusive stop frame of the current run
    stop_frame: u64,
    next_progress: u64,
}

impl Transport {
    fn position(&self, now: Duration, sample_rate: u32) -> u64 {
        if !self.playing {
            return self.anchor_frame;
        }
        let elapsed = now.saturating_sub(self.anchor_time);
        let advanced = elapsed.as_nanos() * sample_rate as u128 / 1_000_000_000;
        let advanced = u64::try_from(advanced).unwrap_or(u64::MAX);
        self.anchor_frame.saturating_add(advanced).min(self.stop_frame)
    }

    fn start(&mut self, from: u64, stop: u64, now: Duration, interval: u64) {
        self.playing = true;
        self.anchor_frame = from;
        self.anchor_time = now;
        self.stop_frame = stop;
        self.next_progress = (from / interval + 1) * interval;
    }

    fn halt(&mut self, at: u64) {
        self.playing = false;
        self.anchor_frame = at;
    }
}

/// Clock-driven engine with symphonia decoding
pub struct HeadlessEngine<S = AutoSource> {
    source: S,
    clock: Arc<dyn Clock>,
    progress_interval: u64,
    asset: Option<DecodedAudio>,
    transport: Transport,
    signals: VecDeque<EngineSignal>,
}

impl HeadlessEngine<AutoSource> {
    /// Engine reading local files and http(s) URLs on the wall clock
    pub fn new() -> Self {
        Self::with_parts(AutoSource::new(), Arc::new(SystemClock::new()))
    }
}

impl Default for HeadlessEngine<AutoSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ByteSource> HeadlessEngine<S> {
    pub fn with_parts(source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            asset: None,
            transport: Transport::default(),
            signals: VecDeque::new(),
        }
    }

    /// Frames between progress signals (zero is treated as one)
    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames.max(1);
        self
    }

    /// The resident decoded asset
    pub fn asset(&self) -> Option<&DecodedAudio> {
        self.asset.as_ref()
    }

    /// Current transport position
    pub fn position(&self) -> u64 {
        match &self.asset {
            Some(asset) => self
                .transport
                .position(self.clock.now(), asset.sample_rate()),
            None => 0,
        }
    }

    fn require_asset(&self) -> Result<&DecodedAudio> {
        self.asset
            .as_ref()
            .ok_or_else(|| Error::Playback("no asset loaded".to_string()))
    }

    /// Fold elapsed time into the transport and queue any due signals
    fn advance(&mut self) {
        let Some(asset) = self.asset.as_ref() else {
            return;
        };
        if !self.transport.playing {
            return;
        }
        let position = self.transport.position(self.clock.now(), asset.sample_rate());
        if position >= self.transport.stop_frame {
            self.transport.halt(position);
            debug!("Transport finished at frame {}", position);
            self.signals.push_back(EngineSignal::Finished { frame: position });
        } else if position >= self.transport.next_progress {
            let interval = self.progress_interval;
            self.transport.next_progress = (position / interval + 1) * interval;
            self.signals.push_back(EngineSignal::Progress { frame: position });
        }
    }
}

impl<S: ByteSource> AudioEngine for HeadlessEngine<S> {
    async fn load(&mut self, url: &str) -> Result<()> {
        let bytes = self.source.fetch(url).await?;
        let hint = extension_hint(url);
        let decoded = decode_off_thread(bytes, hint).await?;
        self.adopt(decoded).await
    }

    fn play(&mut self) -> Result<()> {
        if self.transport.playing {
            return Ok(());
        }
        let asset = self.require_asset()?;
        let frame_count = asset.frame_count();
        let from = self.transport.anchor_frame;
        let (from, stop) = if from >= frame_count {
            (0, frame_count)
        } else if from < self.transport.stop_frame {
            (from, self.transport.stop_frame)
        } else {
            (from, frame_count)
        };
        let now = self.clock.now();
        self.transport.start(from, stop, now, self.progress_interval);
        debug!("Playing frames {}..{}", from, stop);
        Ok(())
    }

    fn play_from(&mut self, start_frame: u64) -> Result<()> {
        let frame_count = self.require_asset()?.frame_count();
        if start_frame >= frame_count {
            return Err(Error::Playback(format!(
                "start frame {} is beyond the last frame ({} frames)",
                start_frame, frame_count
            )));
        }
        let now = self.clock.now();
        self.signals.clear();
        self.transport
            .start(start_frame, frame_count, now, self.progress_interval);
        debug!("Playing frames {}..{}", start_frame, frame_count);
        Ok(())
    }

    fn play_range(&mut self, start_frame: u64, end_frame: u64) -> Result<()> {
        let frame_count = self.require_asset()?.frame_count();
        if start_frame >= end_frame {
            return Err(Error::InvalidInput(format!(
                "empty range {}..{}",
                start_frame, end_frame
            )));
        }
        if start_frame >= frame_count {
            return Err(Error::Playback(format!(
                "start frame {} is beyond the last frame ({} frames)",
                start_frame, frame_count
            )));
        }
        let stop = end_frame.min(frame_count);
        let now = self.clock.now();
        self.signals.clear();
        self.transport
            .start(start_frame, stop, now, self.progress_interval);
        debug!("Playing range {}..{}", start_frame, stop);
        Ok(())
    }

    fn pause(&mut self) -> u64 {
        let position = self.position();
        if self.transport.playing {
            self.transport.halt(position);
            debug!("Paused at frame {}", position);
        }
        position
    }

    fn is_playing(&self) -> bool {
        match &self.asset {
            Some(asset) => {
                self.transport.playing
                    && self.transport.position(self.clock.now(), asset.sample_rate())
                        < self.transport.stop_frame
            }
            None => false,
        }
    }

    fn metadata(&self) -> Result<Metadata> {
        self.require_asset().map(DecodedAudio::metadata)
    }

    fn poll_signal(&mut self) -> Option<EngineSignal> {
        if self.signals.is_empty() {
            self.advance();
        }
        self.signals.pop_front()
    }

    fn unload(&mut self) {
        self.asset = None;
        self.transport = Transport::default();
        self.signals.clear();
    }
}

impl<S: ByteSource> StagedEngine for HeadlessEngine<S> {
    type Decoded = DecodedAudio;

    async fn decode(&mut self, bytes: Vec<u8>) -> Result<DecodedAudio> {
        decode_off_thread(bytes, None).await
    }

    async fn adopt(&mut self, decoded: DecodedAudio) -> Result<()> {
        let metadata = decoded.metadata();
        if metadata.sample_rate == 0 || metadata.channel_count == 0 {
            return Err(Error::Adopt(format!(
                "unsupported layout: {} Hz, {} channels",
                metadata.sample_rate, metadata.channel_count
            )));
        }
        self.asset = Some(decoded);
        self.transport = Transport::default();
        self.signals.clear();
        info!(
            "Adopted asset: {} Hz, {} channels, {} frames",
            metadata.sample_rate, metadata.channel_count, metadata.frame_count
        );
        Ok(())
    }
}

async fn decode_off_thread(bytes: Vec<u8>, hint: Option<String>) -> Result<DecodedAudio> {
    tokio::task::spawn_blocking(move || SimpleDecoder::decode_bytes(bytes, hint.as_deref()))
        .await
        .map_err(|e| Error::Decode(format!("Decode task failed: {}", e)))?
}

/// Builds [`HeadlessEngine`]s
#[derive(Clone)]
pub struct HeadlessEngineFactory<S = AutoSource> {
    source: S,
    clock: Arc<dyn Clock>,
    progress_interval: u64,
}

impl HeadlessEngineFactory<AutoSource> {
    pub fn new() -> Self {
        Self::with_parts(AutoSource::new(), Arc::new(SystemClock::new()))
    }
}

impl Default for HeadlessEngineFactory<AutoSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ByteSource + Clone> HeadlessEngineFactory<S> {
    pub fn with_parts(source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames;
        self
    }
}

impl<S: ByteSource + Clone> EngineFactory for HeadlessEngineFactory<S> {
    type Engine = HeadlessEngine<S>;

    async fn initialize(&self) -> Result<HeadlessEngine<S>> {
        if self.progress_interval == 0 {
            return Err(Error::EngineInit(
                "progress interval must be greater than zero".to_string(),
            ));
        }
        Ok(
            HeadlessEngine::with_parts(self.source.clone(), Arc::clone(&self.clock))
                .with_progress_interval(self.progress_interval),
        )
    }
}
