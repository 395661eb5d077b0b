use driftwave_player::{EventKind, ListenerId, PlayerEvent};
use driftwave_player::{AssetLoader, AudioEngine, Player};
use std::sync::{Arc, Mutex};

/// Records every event a facade emits
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl EventRecorder {
    /// Register on every event kind of `player`
    pub fn attach<E: AudioEngine, L: AssetLoader<E>>(player: &Player<E, L>) -> Self {
        let recorder = Self::default();
        for kind in EventKind::ALL {
            recorder.listen(player, kind);
        }
        recorder
    }

    pub fn listen<E: AudioEngine, L: AssetLoader<E>>(
        &self,
        player: &Player<E, L>,
        kind: EventKind,
    ) -> ListenerId {
        let events = Arc::clone(&self.events);
        player.on(kind, move |event| events.lock().unwrap().push(event.clone()))
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(PlayerEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}
