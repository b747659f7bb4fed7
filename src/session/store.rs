//! Thread-safe call-session store
//!
//! Wraps the pure [`SessionState`] machine for shared use: one store is
//! created at startup and lives for the process lifetime. All components
//! read through [`CallSessionStore::snapshot`] and mutate only through the
//! action methods; observers are notified synchronously after every state
//! change so a rendering layer stays consistent with the store.

use super::state::{CallDisplay, SessionState};
use crate::peer::{ConnectionState, Peer};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type ObserverFn = dyn Fn(&CallSnapshot) + Send + Sync;

/// Point-in-time view of the call session, handed to observers and
/// rendering code. Never mutated in place; re-read after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSnapshot {
    /// The single call display slot, `None` when idle
    pub display: Option<CallDisplay>,
    /// Pending incoming calls, arrival order
    pub incoming: Vec<Peer>,
    /// Rendering signal for pending/urgent states; no call-state semantics
    pub blink: bool,
}

/// Identifies a registered observer for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

struct StoreState {
    session: SessionState,
    blink: bool,
}

/// The single source of truth for call state.
pub struct CallSessionStore {
    state: Mutex<StoreState>,
    observers: Mutex<Vec<(u64, Arc<ObserverFn>)>>,
    next_observer_id: AtomicU64,
}

impl CallSessionStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                session: SessionState::new(),
                blink: false,
            }),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
        }
    }

    /// Register an observer called synchronously after every state change.
    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&CallSnapshot) + Send + Sync + 'static,
    {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);
        self.observers.lock().push((id, Arc::new(observer)));
        ObserverId(id)
    }

    /// Remove an observer. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.observers.lock().retain(|(oid, _)| *oid != id.0);
    }

    pub fn snapshot(&self) -> CallSnapshot {
        let state = self.state.lock();
        CallSnapshot {
            display: state.session.display().cloned(),
            incoming: state.session.incoming().to_vec(),
            blink: state.blink,
        }
    }

    /// Runs a mutation against the state machine and notifies observers if
    /// anything changed. The state lock is released before observers run.
    fn mutate<F>(&self, mutation: F) -> bool
    where
        F: FnOnce(&mut SessionState) -> bool,
    {
        let snapshot = {
            let mut state = self.state.lock();
            if !mutation(&mut state.session) {
                return false;
            }
            CallSnapshot {
                display: state.session.display().cloned(),
                incoming: state.session.incoming().to_vec(),
                blink: state.blink,
            }
        };
        self.notify(&snapshot);
        true
    }

    fn notify(&self, snapshot: &CallSnapshot) {
        let observers: Vec<Arc<ObserverFn>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for observer in observers {
            observer(snapshot);
        }
    }

    // --- Operator actions ---

    /// Optimistically accept a ringing peer; the caller confirms with the
    /// backend afterwards and rolls back via [`CallSessionStore::remove_peer`]
    /// on confirmed failure.
    pub fn accept_call(&self, peer_id: &str) -> bool {
        self.mutate(|s| s.accept_call(peer_id))
    }

    /// Place an operator-initiated call.
    pub fn start_outgoing(&self, peer: Peer) -> bool {
        self.mutate(|s| s.start_outgoing(peer))
    }

    /// Clear the display after a confirmed end-call command.
    pub fn end_call(&self) -> bool {
        self.mutate(|s| s.end_call())
    }

    pub fn dismiss_rejected(&self) -> bool {
        self.mutate(|s| s.dismiss_rejected())
    }

    pub fn dismiss_errored(&self) -> bool {
        self.mutate(|s| s.dismiss_errored())
    }

    /// Rollback / explicit-rejection path; idempotent.
    pub fn remove_peer(&self, peer_id: &str) -> bool {
        self.mutate(|s| s.remove_peer(peer_id))
    }

    // --- Backend-pushed transitions ---

    pub fn add_incoming(&self, peer: Peer) -> bool {
        self.mutate(|s| s.add_incoming(peer))
    }

    pub fn error_peer(&self, peer_id: &str, reason: &str) -> bool {
        self.mutate(|s| s.error_peer(peer_id, reason))
    }

    pub fn confirm_outgoing(&self, peer_id: &str) -> bool {
        self.mutate(|s| s.confirm_outgoing(peer_id))
    }

    pub fn reject_outgoing(&self, peer_id: &str) -> bool {
        self.mutate(|s| s.reject_outgoing(peer_id))
    }

    pub fn set_connection_state(&self, state: ConnectionState) -> bool {
        self.mutate(|s| s.set_connection_state(state))
    }

    // --- Rendering signal ---

    /// Flip the blink flag. Driven by the timer in [`crate::blink`]; has no
    /// effect on call state but observers are re-notified so pending
    /// entries can flash.
    pub fn toggle_blink(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            state.blink = !state.blink;
            CallSnapshot {
                display: state.session.display().cloned(),
                incoming: state.session.incoming().to_vec(),
                blink: state.blink,
            }
        };
        self.notify(&snapshot);
    }

    pub fn blink(&self) -> bool {
        self.state.lock().blink
    }
}

impl Default for CallSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn peer(id: &str) -> Peer {
        Peer::new(id, id.to_uppercase(), "118.725")
    }

    #[test]
    fn test_observers_notified_on_every_change() {
        let store = CallSessionStore::new();
        let notifications = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&notifications);
        store.subscribe(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        store.add_incoming(peer("a"));
        store.accept_call("a");
        store.end_call();

        assert_eq!(notifications.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_noop_mutations_do_not_notify() {
        let store = CallSessionStore::new();
        let notifications = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&notifications);
        store.subscribe(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        // All of these violate a precondition and are absorbed silently.
        store.accept_call("ghost");
        store.end_call();
        store.dismiss_rejected();
        store.remove_peer("ghost");
        store.set_connection_state(ConnectionState::Disconnected);

        assert_eq!(notifications.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribed_observer_stops_receiving() {
        let store = CallSessionStore::new();
        let notifications = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&notifications);
        let id = store.subscribe(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        store.add_incoming(peer("a"));
        store.unsubscribe(id);
        store.add_incoming(peer("b"));

        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshot_reflects_observer_payload() {
        let store = CallSessionStore::new();
        let seen: Arc<Mutex<Vec<CallSnapshot>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        store.subscribe(move |snapshot| {
            sink.lock().push(snapshot.clone());
        });

        store.add_incoming(peer("a"));
        store.accept_call("a");

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].incoming.len(), 1);
        assert!(seen[1].display.as_ref().is_some_and(CallDisplay::is_accepted));
        assert_eq!(seen[1], store.snapshot());
    }

    #[test]
    fn test_blink_toggle_notifies_without_call_state_change() {
        let store = CallSessionStore::new();
        store.add_incoming(peer("a"));

        assert!(!store.blink());
        store.toggle_blink();
        assert!(store.blink());

        // Blink resets carry no call-state semantics.
        let snapshot = store.snapshot();
        assert_eq!(snapshot.incoming.len(), 1);
        assert!(snapshot.display.is_none());
    }

    #[test]
    fn test_observer_can_read_store() {
        // Observers run outside the state lock, so reading back is fine.
        let store = Arc::new(CallSessionStore::new());
        let inner = Arc::clone(&store);
        let ok = Arc::new(AtomicUsize::new(0));
        let ok_inner = Arc::clone(&ok);

        store.subscribe(move |snapshot| {
            assert_eq!(inner.snapshot(), *snapshot);
            ok_inner.fetch_add(1, Ordering::SeqCst);
        });

        store.add_incoming(peer("a"));
        assert_eq!(ok.load(Ordering::SeqCst), 1);
    }
}
