//! Remote call party types
//!
//! Peers are supplied by the signaling backend; the client never invents an
//! id. The id is stable for the lifetime of the backend session.

use serde::{Deserialize, Serialize};

/// A remote radio/telephone party the operator can call or be called by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Backend-assigned unique identifier
    pub id: String,
    /// Human-readable name shown on the console (e.g. a callsign)
    pub display_name: String,
    /// Frequency label; not necessarily unique across peers
    pub frequency: String,
}

impl Peer {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        frequency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            frequency: frequency.into(),
        }
    }
}

/// Transport health of the live call, independent of call existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Media transport is up
    #[default]
    Connected,
    /// Media transport dropped; the call itself still exists
    Disconnected,
}
