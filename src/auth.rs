//! Authentication status store
//!
//! Mirrors the backend's session state for the UI: starts in `Loading`
//! until the first `auth:*` push arrives. The login flow itself is an
//! external collaborator; this store only reflects its outcome.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    #[default]
    Loading,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Default)]
struct AuthState {
    cid: String,
    status: AuthStatus,
}

/// Process-wide authentication state.
#[derive(Debug, Default)]
pub struct AuthStore {
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AuthStatus {
        self.state.read().status.clone()
    }

    /// The authenticated client id; empty unless authenticated.
    pub fn cid(&self) -> String {
        self.state.read().cid.clone()
    }

    pub fn set_authenticated(&self, cid: impl Into<String>) {
        let mut state = self.state.write();
        state.cid = cid.into();
        state.status = AuthStatus::Authenticated;
        tracing::info!(cid = %state.cid, "authenticated");
    }

    pub fn set_unauthenticated(&self) {
        let mut state = self.state.write();
        state.cid.clear();
        state.status = AuthStatus::Unauthenticated;
        tracing::info!("unauthenticated");
    }
}
