//! Call-session state machine
//!
//! Defines the single call-display slot, the incoming-call queue and every
//! transition between them. The machine is pure: no locking, no I/O. All
//! mutation goes through the methods here; the thread-safe wrapper lives in
//! [`super::store`].
//!
//! Preconditions that do not hold (accepting a peer that is no longer
//! queued, a connection-state update for a call that already ended) are
//! absorbed as no-ops rather than errors, because they legitimately occur
//! when an operator action races a backend push.

use crate::peer::{ConnectionState, Peer};
use serde::{Deserialize, Serialize};

/// The single prominent call slot.
///
/// At most one `CallDisplay` exists at a time; the slot is `None` when the
/// console is idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallDisplay {
    /// Operator-initiated call awaiting backend confirmation
    Outgoing { peer: Peer },
    /// Live call; `connection` reflects transport health only
    Accepted {
        peer: Peer,
        connection: ConnectionState,
    },
    /// The remote party declined; retained until the operator dismisses it
    Rejected { peer: Peer },
    /// The call failed; retained until the operator dismisses it
    Error { peer: Peer, reason: String },
}

impl CallDisplay {
    /// The peer occupying the slot, whatever the variant.
    pub fn peer(&self) -> &Peer {
        match self {
            CallDisplay::Outgoing { peer } => peer,
            CallDisplay::Accepted { peer, .. } => peer,
            CallDisplay::Rejected { peer } => peer,
            CallDisplay::Error { peer, .. } => peer,
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer().id
    }

    /// Whether the slot holds a live, accepted call.
    pub fn is_accepted(&self) -> bool {
        matches!(self, CallDisplay::Accepted { .. })
    }

    /// Whether the operator can still hang this call up (as opposed to
    /// dismissing a terminal rejected/errored display).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CallDisplay::Outgoing { .. } | CallDisplay::Accepted { .. }
        )
    }
}

/// Call display slot plus the incoming-call queue.
///
/// Invariants upheld by every method:
/// - at most one display exists, and its peer never also sits in the queue;
/// - a peer appears at most once in the queue (FIFO, arrival order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    display: Option<CallDisplay>,
    incoming: Vec<Peer>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> Option<&CallDisplay> {
        self.display.as_ref()
    }

    pub fn incoming(&self) -> &[Peer] {
        &self.incoming
    }

    fn queued_position(&self, peer_id: &str) -> Option<usize> {
        self.incoming.iter().position(|p| p.id == peer_id)
    }

    /// Place an operator-initiated call. Only valid while the display is
    /// empty; a second outgoing call while one is pending is ignored.
    pub fn start_outgoing(&mut self, peer: Peer) -> bool {
        if self.display.is_some() {
            tracing::trace!(peer_id = %peer.id, "start_outgoing ignored, display occupied");
            return false;
        }
        // An outgoing call to a peer that happens to be ringing us takes
        // the queued entry with it, keeping the display/queue invariant.
        if let Some(pos) = self.queued_position(&peer.id) {
            self.incoming.remove(pos);
        }
        tracing::debug!(peer_id = %peer.id, "call display: empty -> outgoing");
        self.display = Some(CallDisplay::Outgoing { peer });
        true
    }

    /// Backend confirmed the outgoing call; the remote party picked up.
    pub fn confirm_outgoing(&mut self, peer_id: &str) -> bool {
        match self.display.take() {
            Some(CallDisplay::Outgoing { peer }) if peer.id == peer_id => {
                tracing::debug!(%peer_id, "call display: outgoing -> accepted");
                self.display = Some(CallDisplay::Accepted {
                    peer,
                    connection: ConnectionState::Connected,
                });
                true
            }
            other => {
                self.display = other;
                false
            }
        }
    }

    /// The remote party declined the outgoing call. The display is kept in
    /// the rejected state so the operator can see who declined.
    pub fn reject_outgoing(&mut self, peer_id: &str) -> bool {
        match self.display.take() {
            Some(CallDisplay::Outgoing { peer }) if peer.id == peer_id => {
                tracing::debug!(%peer_id, "call display: outgoing -> rejected");
                self.display = Some(CallDisplay::Rejected { peer });
                true
            }
            other => {
                self.display = other;
                false
            }
        }
    }

    /// Accept a ringing peer, optimistically, before backend confirmation.
    ///
    /// Preconditions: the queue contains the peer and the display is empty.
    /// On confirmed command failure the caller rolls back with
    /// [`SessionState::remove_peer`]; rollback is not hidden in here so the
    /// failure ordering stays visible to the caller.
    pub fn accept_call(&mut self, peer_id: &str) -> bool {
        if self.display.is_some() {
            tracing::trace!(%peer_id, "accept_call ignored, display occupied");
            return false;
        }
        let Some(pos) = self.queued_position(peer_id) else {
            tracing::trace!(%peer_id, "accept_call ignored, peer not queued");
            return false;
        };
        let peer = self.incoming.remove(pos);
        tracing::debug!(%peer_id, "call display: empty -> accepted");
        self.display = Some(CallDisplay::Accepted {
            peer,
            connection: ConnectionState::Connected,
        });
        true
    }

    /// Clear the display unconditionally, whatever its variant. Used after
    /// a confirmed end-call command.
    pub fn end_call(&mut self) -> bool {
        match self.display.take() {
            Some(cleared) => {
                tracing::debug!(peer_id = %cleared.peer_id(), "call display cleared");
                true
            }
            None => false,
        }
    }

    /// Clear the display only if the remote party rejected the call.
    pub fn dismiss_rejected(&mut self) -> bool {
        if matches!(self.display, Some(CallDisplay::Rejected { .. })) {
            self.display = None;
            true
        } else {
            false
        }
    }

    /// Clear the display only if the call errored.
    pub fn dismiss_errored(&mut self) -> bool {
        if matches!(self.display, Some(CallDisplay::Error { .. })) {
            self.display = None;
            true
        } else {
            false
        }
    }

    /// An asynchronous transport failure surfaced for `peer_id`.
    ///
    /// Transitions the display to the error state, preserving the peer, if
    /// the display belongs to that peer and has not already errored. The
    /// first reason wins; a duplicate failure push is absorbed.
    pub fn error_peer(&mut self, peer_id: &str, reason: &str) -> bool {
        match self.display.take() {
            Some(display) if display.peer_id() == peer_id => {
                if let CallDisplay::Error { .. } = display {
                    self.display = Some(display);
                    return false;
                }
                tracing::debug!(%peer_id, %reason, "call display -> error");
                self.display = Some(CallDisplay::Error {
                    peer: display.peer().clone(),
                    reason: reason.to_string(),
                });
                true
            }
            other => {
                self.display = other;
                false
            }
        }
    }

    /// Remove a peer wherever it sits: the queue entry if present, and the
    /// display if it belongs to that peer. Idempotent; also the rollback
    /// path for a failed optimistic accept.
    pub fn remove_peer(&mut self, peer_id: &str) -> bool {
        let mut changed = false;
        if let Some(pos) = self.queued_position(peer_id) {
            self.incoming.remove(pos);
            changed = true;
        }
        if self.display.as_ref().is_some_and(|d| d.peer_id() == peer_id) {
            tracing::debug!(%peer_id, "call display cleared (peer removed)");
            self.display = None;
            changed = true;
        }
        changed
    }

    /// Append a ringing peer to the queue.
    ///
    /// Idempotent: a duplicate backend notification for a peer already
    /// queued, or for the peer currently occupying the display, is absorbed.
    pub fn add_incoming(&mut self, peer: Peer) -> bool {
        if self.queued_position(&peer.id).is_some() {
            return false;
        }
        if self.display.as_ref().is_some_and(|d| d.peer_id() == peer.id) {
            return false;
        }
        tracing::debug!(peer_id = %peer.id, "incoming call queued");
        self.incoming.push(peer);
        true
    }

    /// Update transport health of the live call. A no-op unless the display
    /// is in the accepted state, so a late disconnect notification cannot
    /// resurrect or downgrade a display that already moved on.
    pub fn set_connection_state(&mut self, state: ConnectionState) -> bool {
        match &mut self.display {
            Some(CallDisplay::Accepted { connection, .. }) if *connection != state => {
                tracing::debug!(?state, "call connection state changed");
                *connection = state;
                true
            }
            _ => false,
        }
    }
}
