//! The playback facade
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──load──► Loading ──ok──► Ready ◄──────────────┐
//!       ▲                    │                │ play/play_from/ │ finished
//!       │                    └──err──► Error  ▼ play_range      │
//!   (create)                           │   Playing ────────────┘
//!                                      │    │   ▲
//!                              load ◄──┘    │   │ play/play_from/play_range
//!                                     pause ▼   │
//!                                          Paused
//! ```
//!
//! `load` is legal from every state except Loading, so a failed load can be
//! retried immediately. A failed load leaves the facade in Error with the
//! engine unloaded; nothing partial stays resident.
//!
//! # Guards
//!
//! Transport commands and queries never fail. When a precondition is not met
//! (engine absent, no asset, illegal transition, operation outside the
//! capability profile) the call is ignored: commands return
//! `CallOutcome::Ignored`, `pause` returns `None`, `is_playing` returns
//! `false`, `metadata` returns `None`, and no event is emitted.
//!
//! # Concurrency
//!
//! Every mutating operation takes `&mut self`, so loads on one facade are
//! serialized by construction. If a `load` future is dropped before it
//! completes, the facade is left in Loading; the next mutating call settles
//! it to Error and unloads the engine.

use super::outcome::{CallOutcome, IgnoreReason, Operation};
use crate::engine::{AudioEngine, EngineFactory, EngineHandle, EngineSignal};
use crate::loader::{AssetLoader, DelegatedLoader};
use driftwave_common::{
    CapabilityProfile, Error, EventEmitter, EventKind, ListenerId, Listeners, Metadata,
    PlaybackState, PlayerConfig, PlayerEvent, Result,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Event-driven control facade over one engine
pub struct Player<E, L = DelegatedLoader> {
    engine: EngineHandle<E>,
    loader: L,
    state: PlaybackState,
    events: EventEmitter,
    config: PlayerConfig,
    listener_failures: u64,
}

impl<E: AudioEngine> Player<E, DelegatedLoader> {
    /// Initialize an engine and wrap it in a facade using delegated loading
    ///
    /// # Errors
    /// `Error::EngineInit` if the factory fails; no facade is produced.
    pub async fn create<F>(factory: &F, config: PlayerConfig) -> Result<Self>
    where
        F: EngineFactory<Engine = E>,
    {
        Self::create_with_loader(factory, DelegatedLoader, config).await
    }
}

impl<E: AudioEngine, L: AssetLoader<E>> Player<E, L> {
    /// Initialize an engine and wrap it in a facade using `loader`
    pub async fn create_with_loader<F>(factory: &F, loader: L, config: PlayerConfig) -> Result<Self>
    where
        F: EngineFactory<Engine = E>,
    {
        let mut player = Self::unbound(loader, config);

        let engine = factory.initialize().await.map_err(|e| {
            error!("Engine initialization failed: {}", e);
            match e {
                Error::EngineInit(_) => e,
                other => Error::EngineInit(other.to_string()),
            }
        })?;
        player.engine.bind(engine)?;

        info!(
            "Player created ({:?} profile, {} loading)",
            player.config.profile,
            player.loader.protocol()
        );
        Ok(player)
    }

    pub(crate) fn unbound(loader: L, config: PlayerConfig) -> Self {
        Self {
            engine: EngineHandle::absent(),
            loader,
            state: PlaybackState::Uninitialized,
            events: EventEmitter::with_capacity(config.event_channel_capacity),
            config,
            listener_failures: 0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors and event registration
    // ------------------------------------------------------------------

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn profile(&self) -> CapabilityProfile {
        self.config.profile
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The bound engine, for inspection
    pub fn engine(&self) -> Option<&E> {
        self.engine.get()
    }

    /// Registration handle for observers that manage their own listeners,
    /// e.g. one that unregisters itself; it cannot emit
    pub fn listeners(&self) -> Listeners {
        self.events.listeners()
    }

    /// Register a listener; see [`Listeners::on`]
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback)
    }

    /// Remove one listener, or every listener for `kind`
    pub fn off(&self, kind: EventKind, listener: Option<ListenerId>) {
        self.events.off(kind, listener)
    }

    /// Async stream of every event this facade emits
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Listener panics caught since creation
    pub fn listener_failures(&self) -> u64 {
        self.listener_failures
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    /// Load the asset at `url`, replacing any resident asset
    ///
    /// On success the state becomes Ready and `ready` is emitted. On failure
    /// the state becomes Error, the engine is unloaded, `error` is emitted with
    /// the failure, and the same failure is returned.
    ///
    /// Without a bound engine this is a no-op that returns `Ok(())`.
    pub async fn load(&mut self, url: &str) -> Result<()> {
        self.settle_abandoned_load();
        if !self.engine.is_present() {
            debug!("Ignoring load of {}: {}", url, IgnoreReason::EngineAbsent);
            return Ok(());
        }

        let previous = self.state;
        self.state = PlaybackState::Loading;
        info!(
            "Loading {} via {} loader (was {})",
            url,
            self.loader.protocol(),
            previous
        );

        match self.run_loader(url).await {
            Ok(metadata) => {
                self.state = PlaybackState::Ready;
                info!(
                    "Loaded {}: {} Hz, {} channels, {} frames",
                    url, metadata.sample_rate, metadata.channel_count, metadata.frame_count
                );
                self.emit(PlayerEvent::Ready);
                Ok(())
            }
            Err(failure) => {
                if let Some(engine) = self.engine.get_mut() {
                    engine.unload();
                }
                self.state = PlaybackState::Error;
                error!("Failed to load {}: {}", url, failure);
                self.emit(PlayerEvent::Error {
                    error: failure.clone(),
                });
                Err(failure)
            }
        }
    }

    async fn run_loader(&mut self, url: &str) -> Result<Metadata> {
        let Self {
            engine,
            loader,
            config,
            ..
        } = self;
        let engine = engine
            .get_mut()
            .ok_or_else(|| Error::EngineInit("engine not initialized".to_string()))?;

        let load = loader.load(engine, url);
        match config.load_timeout() {
            Some(limit) => match tokio::time::timeout(limit, load).await {
                Ok(result) => result?,
                Err(_) => {
                    let limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    return Err(Error::LoadTimeout(limit_ms));
                }
            },
            None => load.await?,
        }

        // A loader reporting success must leave a decoded asset behind
        engine
            .metadata()
            .map_err(|e| Error::Adopt(format!("engine holds no asset after load: {}", e)))
    }

    // ------------------------------------------------------------------
    // Transport commands
    // ------------------------------------------------------------------

    /// Start or resume playback from the current position
    ///
    /// Ready|Paused → Playing, emits `play`.
    pub fn play(&mut self) -> CallOutcome {
        self.command(Operation::Play, |engine| engine.play())
    }

    /// Start playback at `start_frame` (0-based)
    ///
    /// Ready|Paused|Playing → Playing, emits `play`. Frames outside the asset
    /// are refused by the engine (`CallOutcome::Rejected`).
    pub fn play_from(&mut self, start_frame: u64) -> CallOutcome {
        self.command(Operation::PlayFrom, |engine| engine.play_from(start_frame))
    }

    /// Play `[start_frame, end_frame)`; the engine stops at `end_frame` and
    /// the facade reports it through `poll_engine` as `ended`
    pub fn play_range(&mut self, start_frame: u64, end_frame: u64) -> CallOutcome {
        self.command(Operation::PlayRange, |engine| {
            engine.play_range(start_frame, end_frame)
        })
    }

    /// Pause playback and return the frame the engine stopped at
    ///
    /// Playing → Paused, emits `pause` with the frame. In Ready or Paused the
    /// engine's last known position is returned without an event. Returns
    /// `None` when the call is ignored.
    pub fn pause(&mut self) -> Option<u64> {
        self.settle_abandoned_load();
        self.poll_engine();

        if let Some(reason) = self.guard(Operation::Pause) {
            debug!("Ignoring pause in state {}: {}", self.state, reason);
            return None;
        }

        let frame = self.engine.get_mut()?.pause();
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            info!("Paused at frame {}", frame);
            self.emit(PlayerEvent::Pause { frame });
        } else {
            debug!(
                "pause while {}: reporting last known position {}",
                self.state, frame
            );
        }
        Some(frame)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether playback is running right now
    ///
    /// Consults the engine, so a range that reached its end reads as not
    /// playing even before `poll_engine` reports `ended`.
    pub fn is_playing(&self) -> bool {
        if self.guard(Operation::IsPlaying).is_some() {
            return false;
        }
        self.state == PlaybackState::Playing
            && self.engine.get().map_or(false, |engine| engine.is_playing())
    }

    /// Metadata of the resident asset
    ///
    /// Engine failures are absorbed into `None`.
    pub fn metadata(&self) -> Option<Metadata> {
        if let Some(reason) = self.guard(Operation::Metadata) {
            trace!("No metadata in state {}: {}", self.state, reason);
            return None;
        }
        match self.engine.get()?.metadata() {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!("Engine could not report metadata: {}", e);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Engine notifications
    // ------------------------------------------------------------------

    /// Drain engine notifications and emit the matching events
    ///
    /// `Progress` becomes a `progress` event; `Finished` moves Playing to
    /// Ready and emits `ended`. If the engine stopped without signalling,
    /// the stop is reported the same way. Returns the number of events
    /// emitted. Transport commands call this first, so pending notifications
    /// are delivered before the command's own event.
    pub fn poll_engine(&mut self) -> usize {
        let mut emitted = 0;

        loop {
            let signal = match self.engine.get_mut() {
                Some(engine) => engine.poll_signal(),
                None => return emitted,
            };
            let Some(signal) = signal else {
                break;
            };

            match signal {
                EngineSignal::Progress { frame } => {
                    if self.state == PlaybackState::Playing && self.full_profile() {
                        self.emit(PlayerEvent::Progress { frame });
                        emitted += 1;
                    }
                }
                EngineSignal::Finished { frame } => {
                    if self.state == PlaybackState::Playing {
                        emitted += self.finish(frame);
                    } else {
                        trace!("Stale finish signal at frame {} in state {}", frame, self.state);
                    }
                }
            }
        }

        if self.state == PlaybackState::Playing {
            let stopped_at = match self.engine.get_mut() {
                Some(engine) if !engine.is_playing() => Some(engine.pause()),
                _ => None,
            };
            if let Some(frame) = stopped_at {
                emitted += self.finish(frame);
            }
        }

        emitted
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn full_profile(&self) -> bool {
        self.config.profile == CapabilityProfile::Full
    }

    fn finish(&mut self, frame: u64) -> usize {
        self.state = PlaybackState::Ready;
        info!("Playback finished at frame {}", frame);
        if self.full_profile() {
            self.emit(PlayerEvent::Ended { frame });
            1
        } else {
            0
        }
    }

    /// Why `op` may not run now, if it may not
    fn guard(&self, op: Operation) -> Option<IgnoreReason> {
        if !self.engine.is_present() {
            return Some(IgnoreReason::EngineAbsent);
        }
        if !self.full_profile() && op != Operation::Play {
            return Some(IgnoreReason::Unsupported);
        }
        if !self.state.has_asset() {
            return Some(IgnoreReason::NoAsset);
        }
        if op == Operation::Play && self.state == PlaybackState::Playing {
            return Some(IgnoreReason::AlreadyPlaying);
        }
        None
    }

    fn command<F>(&mut self, op: Operation, dispatch: F) -> CallOutcome
    where
        F: FnOnce(&mut E) -> Result<()>,
    {
        self.settle_abandoned_load();
        self.poll_engine();

        if let Some(reason) = self.guard(op) {
            debug!("Ignoring {} in state {}: {}", op, self.state, reason);
            return CallOutcome::Ignored(reason);
        }

        let result = match self.engine.get_mut() {
            Some(engine) => dispatch(engine),
            None => return CallOutcome::Ignored(IgnoreReason::EngineAbsent),
        };

        match result {
            Ok(()) => {
                debug!("{}: {} -> {}", op, self.state, PlaybackState::Playing);
                self.state = PlaybackState::Playing;
                self.emit(PlayerEvent::Play);
                CallOutcome::Applied
            }
            Err(refusal) => {
                warn!("Engine rejected {}: {}", op, refusal);
                CallOutcome::Rejected(refusal)
            }
        }
    }

    fn settle_abandoned_load(&mut self) {
        if self.state.can_load() {
            return;
        }
        warn!("Previous load was abandoned before completing; discarding partial state");
        if let Some(engine) = self.engine.get_mut() {
            engine.unload();
        }
        self.state = PlaybackState::Error;
    }

    fn emit(&mut self, event: PlayerEvent) {
        let report = self.events.emit(&event);
        self.listener_failures += report.failures.len() as u64;
    }
}

impl<E, L> std::fmt::Debug for Player<E, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state)
            .field("engine_bound", &self.engine.is_present())
            .field("profile", &self.config.profile)
            .field("events", &self.events)
            .finish()
    }
}
