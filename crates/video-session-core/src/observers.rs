//! Session started/stopped observer registry

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state_table::types::InteractionId;

/// Callback invoked with the interaction ID of the session
pub type SessionCallback = Arc<dyn Fn(&InteractionId) + Send + Sync>;

/// Handle returned on registration, used to remove the observer again
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub struct ObserverId(u64);

/// Which edge an observer is attached to
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub enum ObserverKind {
    SessionStarted,
    SessionStopped,
}

/// Ordered started/stopped callback lists owned by one state machine
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: AtomicU64,
    started: RwLock<Vec<(ObserverId, SessionCallback)>>,
    stopped: RwLock<Vec<(ObserverId, SessionCallback)>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, kind: ObserverKind, callback: F) -> ObserverId
    where
        F: Fn(&InteractionId) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: SessionCallback = Arc::new(callback);
        self.list(kind).write().push((id, callback));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn remove(&self, id: ObserverId) -> bool {
        for kind in [ObserverKind::SessionStarted, ObserverKind::SessionStopped] {
            let mut list = self.list(kind).write();
            if let Some(pos) = list.iter().position(|(existing, _)| *existing == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn len(&self, kind: ObserverKind) -> usize {
        self.list(kind).read().len()
    }

    /// Invoke every observer of `kind` in registration order.
    ///
    /// The list is snapshotted first so a callback may register or remove
    /// observers; such changes apply from the next notification on.
    pub fn notify(&self, kind: ObserverKind, interaction_id: &InteractionId) -> usize {
        let callbacks: Vec<SessionCallback> = self
            .list(kind)
            .read()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in &callbacks {
            callback(interaction_id);
        }
        callbacks.len()
    }

    fn list(&self, kind: ObserverKind) -> &RwLock<Vec<(ObserverId, SessionCallback)>> {
        match kind {
            ObserverKind::SessionStarted => &self.started,
            ObserverKind::SessionStopped => &self.stopped,
        }
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("started", &self.len(ObserverKind::SessionStarted))
            .field("stopped", &self.len(ObserverKind::SessionStopped))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn fires_in_registration_order() {
        let registry = ObserverRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            registry.register(ObserverKind::SessionStarted, move |id| {
                order.lock().push(format!("{}:{}", n, id));
            });
        }

        let fired = registry.notify(ObserverKind::SessionStarted, &InteractionId::from("42"));
        assert_eq!(fired, 3);
        assert_eq!(*order.lock(), vec!["0:42", "1:42", "2:42"]);
        assert_eq!(registry.notify(ObserverKind::SessionStopped, &InteractionId::from("42")), 0);
    }

    #[test]
    fn removed_observer_no_longer_fires() {
        let registry = ObserverRegistry::new();
        let hits = Arc::new(Mutex::new(0));

        let hits_clone = hits.clone();
        let id = registry.register(ObserverKind::SessionStopped, move |_| {
            *hits_clone.lock() += 1;
        });

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        registry.notify(ObserverKind::SessionStopped, &InteractionId::from("1"));
        assert_eq!(*hits.lock(), 0);
    }

    #[test]
    fn registering_from_a_callback_applies_next_time() {
        let registry = Arc::new(ObserverRegistry::new());
        let inner = registry.clone();
        registry.register(ObserverKind::SessionStarted, move |_| {
            inner.register(ObserverKind::SessionStarted, |_| {});
        });

        assert_eq!(registry.notify(ObserverKind::SessionStarted, &InteractionId::from("1")), 1);
        assert_eq!(registry.len(ObserverKind::SessionStarted), 2);
    }
}
