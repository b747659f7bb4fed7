//! Signaling roster and call commands
//!
//! `SignalingStore` mirrors the backend's connection state and the roster
//! of reachable clients. The typed wrappers below are the only two
//! strict-mode signaling commands the console issues; their failure
//! handling (overlay + propagation) comes from the gateway.

use crate::bridge::{CommandError, CommandGateway};
use crate::peer::Peer;
use parking_lot::RwLock;
use serde_json::json;

/// Backend command: place an operator-initiated call.
pub const CMD_START_CALL: &str = "signaling_start_call";
/// Backend command: confirm acceptance of a ringing call.
pub const CMD_ACCEPT_CALL: &str = "signaling_accept_call";
/// Backend command: hang up the current call.
pub const CMD_END_CALL: &str = "signaling_end_call";

/// Place a call to a roster entry. Strict: the caller shows the outgoing
/// display optimistically and rolls it back when this fails.
pub async fn start_call(gateway: &CommandGateway, peer_id: &str) -> Result<(), CommandError> {
    gateway
        .invoke_strict(CMD_START_CALL, json!({ "peerId": peer_id }))
        .await
}

/// Confirm acceptance with the backend. Strict: the caller rolls back its
/// optimistic accept when this fails.
pub async fn accept_call(gateway: &CommandGateway, peer_id: &str) -> Result<(), CommandError> {
    gateway
        .invoke_strict(CMD_ACCEPT_CALL, json!({ "peerId": peer_id }))
        .await
}

/// End the current call with the backend. Strict: the display is only
/// cleared once the backend confirms.
pub async fn end_call(gateway: &CommandGateway, peer_id: &str) -> Result<(), CommandError> {
    gateway
        .invoke_strict(CMD_END_CALL, json!({ "peerId": peer_id }))
        .await
}

#[derive(Debug, Default)]
struct SignalingState {
    connected: bool,
    display_name: String,
    clients: Vec<Peer>,
}

/// Roster of clients reachable through the signaling backend.
#[derive(Debug, Default)]
pub struct SignalingStore {
    state: RwLock<SignalingState>,
}

impl SignalingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(&self) -> bool {
        self.state.read().connected
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.write().connected = connected;
        tracing::info!(connected, "signaling connection state");
    }

    /// The operator's own display name on the network.
    pub fn display_name(&self) -> String {
        self.state.read().display_name.clone()
    }

    pub fn set_display_name(&self, display_name: impl Into<String>) {
        self.state.write().display_name = display_name.into();
    }

    pub fn clients(&self) -> Vec<Peer> {
        self.state.read().clients.clone()
    }

    /// Replace the whole roster, e.g. after (re)connecting.
    pub fn set_clients(&self, clients: Vec<Peer>) {
        self.state.write().clients = clients;
    }

    pub fn add_client(&self, client: Peer) {
        let mut state = self.state.write();
        if state.clients.iter().any(|c| c.id == client.id) {
            return;
        }
        tracing::debug!(id = %client.id, "client joined");
        state.clients.push(client);
    }

    pub fn remove_client(&self, client_id: &str) {
        let mut state = self.state.write();
        let before = state.clients.len();
        state.clients.retain(|c| c.id != client_id);
        if state.clients.len() != before {
            tracing::debug!(id = %client_id, "client left");
        }
    }

    pub fn client(&self, client_id: &str) -> Option<Peer> {
        self.state
            .read()
            .clients
            .iter()
            .find(|c| c.id == client_id)
            .cloned()
    }
}
