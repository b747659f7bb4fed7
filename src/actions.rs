//! Operator call actions
//!
//! Translates operator intent (answer key, call display click, dialling a
//! roster entry) into the optimistic-update-plus-confirmation dance against
//! the store and gateway. Each action is debounce-guarded so a double-click
//! or key repeat cannot put two copies of a command in flight.
//!
//! The rollback contract lives here, not in the store: an optimistic
//! mutation is followed by a strict command, and on confirmed failure the
//! action calls `remove_peer` itself. Keeping both halves in one place
//! makes the failure ordering visible and testable.

use crate::bridge::CommandGateway;
use crate::calllog::{CallDirection, CallLog};
use crate::debounce::DebounceGuard;
use crate::peer::Peer;
use crate::session::{CallDisplay, CallSessionStore};
use crate::signaling;
use std::sync::Arc;

pub struct CallActions {
    store: Arc<CallSessionStore>,
    gateway: Arc<CommandGateway>,
    log: Arc<CallLog>,
    answer_guard: DebounceGuard,
    display_guard: DebounceGuard,
    dial_guard: DebounceGuard,
}

impl CallActions {
    pub fn new(
        store: Arc<CallSessionStore>,
        gateway: Arc<CommandGateway>,
        log: Arc<CallLog>,
    ) -> Self {
        Self {
            store,
            gateway,
            log,
            answer_guard: DebounceGuard::new(),
            display_guard: DebounceGuard::new(),
            dial_guard: DebounceGuard::new(),
        }
    }

    /// Observable busy flag of the answer action, for disabling the keys.
    pub fn answer_busy(&self) -> tokio::sync::watch::Receiver<bool> {
        self.answer_guard.busy_changes()
    }

    /// Answer a ringing peer: optimistic local accept, then backend
    /// confirmation; on confirmed failure the peer is removed entirely
    /// (rejection model: it is not re-queued).
    pub async fn answer(&self, peer_id: &str) {
        self.answer_guard
            .run(|| async {
                // Can't accept a call while something occupies the display.
                if self.store.snapshot().display.is_some() {
                    return;
                }
                if !self.store.accept_call(peer_id) {
                    // Raced away by a backend push; nothing to confirm.
                    return;
                }
                if let Err(err) = signaling::accept_call(&self.gateway, peer_id).await {
                    tracing::warn!(%peer_id, %err, "accept failed, rolling back");
                    self.store.remove_peer(peer_id);
                }
            })
            .await;
    }

    /// Click on the call display: hang up a live/pending call, or dismiss a
    /// terminal rejected/errored one.
    pub async fn display_click(&self) {
        self.display_guard
            .run(|| async {
                let Some(display) = self.store.snapshot().display else {
                    return;
                };
                match display {
                    CallDisplay::Outgoing { peer } | CallDisplay::Accepted { peer, .. } => {
                        // Only a confirmed end clears the display.
                        if signaling::end_call(&self.gateway, &peer.id).await.is_ok() {
                            self.store.end_call();
                        }
                    }
                    CallDisplay::Rejected { .. } => {
                        self.store.dismiss_rejected();
                    }
                    CallDisplay::Error { .. } => {
                        self.store.dismiss_errored();
                    }
                }
            })
            .await;
    }

    /// Dial a roster entry: optimistic outgoing display, then backend
    /// confirmation; rolled back on confirmed failure.
    pub async fn dial(&self, peer: Peer) {
        self.dial_guard
            .run(|| async {
                let peer_id = peer.id.clone();
                let name = peer.display_name.clone();
                let frequency = peer.frequency.clone();
                if !self.store.start_outgoing(peer) {
                    return;
                }
                match signaling::start_call(&self.gateway, &peer_id).await {
                    Ok(()) => {
                        self.log.record(CallDirection::Outgoing, name, frequency);
                    }
                    Err(err) => {
                        tracing::warn!(%peer_id, %err, "dial failed, rolling back");
                        self.store.remove_peer(&peer_id);
                    }
                }
            })
            .await;
    }
}
