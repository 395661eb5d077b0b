//! Per-instance publish/subscribe registry
//!
//! Each facade owns exactly one `EventEmitter`; there is no process-wide
//! instance. Cloning the emitter yields another handle to the same registry,
//! never a new registry. Observers get a [`Listeners`] handle, which can
//! register and unregister (including from inside a listener) but not emit.
//!
//! # Delivery rules
//!
//! - Listeners for an event run in registration order, once per registration.
//! - The listener list is snapshotted before delivery. Calling `on`/`off` from
//!   inside a listener affects the next `emit`, not the one in progress.
//! - A panicking listener is isolated: the panic is caught, recorded in the
//!   returned [`EmitReport`], and delivery continues with the next listener.
//! - Every emitted event is also forwarded to broadcast subscribers. This is
//!   lossy: an event with no subscribers is simply dropped.

use super::{EventKind, PlayerEvent};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Default broadcast capacity (events buffered per lagging subscriber)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Listener callback
pub type Listener = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

/// Handle identifying one registration
///
/// Returned by [`EventEmitter::on`]; pass it to [`EventEmitter::off`] to remove
/// exactly that registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A listener that panicked during delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub listener: ListenerId,
    pub message: String,
}

/// Outcome of a single `emit`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Listeners that ran to completion
    pub delivered: usize,
    /// Listeners that panicked
    pub failures: Vec<ListenerFailure>,
}

struct Registration {
    id: ListenerId,
    callback: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<Registration>>,
}

/// Registration-only handle to an emitter's listener registry
///
/// Supports `on`/`off` but not `emit`, so an owner can share it with
/// observers (including a listener that removes itself) while keeping
/// delivery to itself.
#[derive(Clone, Default)]
pub struct Listeners {
    registry: Arc<Mutex<Registry>>,
}

impl Listeners {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Listeners never run while the lock is held, so a poisoned lock
        // still guards a consistent registry.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `callback` under `kind`
    ///
    /// Registrations accumulate; registering the same closure twice yields
    /// two registrations, each invoked once per emit.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.on_listener(kind, Arc::new(callback))
    }

    /// Register an already shared listener under `kind`
    pub fn on_listener(&self, kind: EventKind, callback: Listener) -> ListenerId {
        let mut registry = self.registry();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push(Registration { id, callback });
        trace!("Registered listener {:?} for '{}'", id, kind);
        id
    }

    /// Remove registrations for `kind`
    ///
    /// With `Some(id)` only that registration is removed; with `None` every
    /// registration for `kind` is cleared. Unknown kinds or ids are a no-op.
    pub fn off(&self, kind: EventKind, listener: Option<ListenerId>) {
        let mut registry = self.registry();
        match listener {
            Some(id) => {
                if let Some(list) = registry.listeners.get_mut(&kind) {
                    list.retain(|registration| registration.id != id);
                    if list.is_empty() {
                        registry.listeners.remove(&kind);
                    }
                }
            }
            None => {
                registry.listeners.remove(&kind);
            }
        }
    }

    /// Number of registrations for `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry()
            .listeners
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn snapshot(&self, kind: EventKind) -> Vec<(ListenerId, Listener)> {
        self.registry()
            .listeners
            .get(&kind)
            .map(|list| {
                list.iter()
                    .map(|registration| (registration.id, Arc::clone(&registration.callback)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Event registry keyed by event kind
#[derive(Clone)]
pub struct EventEmitter {
    listeners: Listeners,
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventEmitter {
    /// Creates an emitter with the default broadcast capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates an emitter whose broadcast channel buffers `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self {
            listeners: Listeners::default(),
            tx,
            capacity,
        }
    }

    /// Registration-only handle sharing this emitter's registry
    pub fn listeners(&self) -> Listeners {
        self.listeners.clone()
    }

    /// See [`Listeners::on`]
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.listeners.on(kind, callback)
    }

    pub fn on_listener(&self, kind: EventKind, callback: Listener) -> ListenerId {
        self.listeners.on_listener(kind, callback)
    }

    /// See [`Listeners::off`]
    pub fn off(&self, kind: EventKind, listener: Option<ListenerId>) {
        self.listeners.off(kind, listener)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.listener_count(kind)
    }

    /// Subscribe to every future event
    ///
    /// Events emitted before subscription are not received. A subscriber that
    /// falls more than the channel capacity behind observes `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Number of live broadcast subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Broadcast channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Deliver `event` to every listener registered under its kind
    ///
    /// Emitting with no listeners is a no-op that returns an empty report.
    pub fn emit(&self, event: &PlayerEvent) -> EmitReport {
        let kind = event.kind();
        let snapshot = self.listeners.snapshot(kind);

        let mut report = EmitReport::default();
        for (id, callback) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!("Listener {:?} for '{}' panicked: {}", id, kind, message);
                    report.failures.push(ListenerFailure {
                        listener: id,
                        message,
                    });
                }
            }
        }

        // Lossy: no subscribers is not an error
        let _ = self.tx.send(event.clone());

        report
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.listeners.registry();
        let counts: HashMap<EventKind, usize> = registry
            .listeners
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "listener panicked".to_string()
    }
}
