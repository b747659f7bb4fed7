//! Host bridge: the two narrow interfaces to the backend
//!
//! The signaling backend and media transport are external systems reached
//! through a request/response command channel ([`HostBridge`] +
//! [`gateway::CommandGateway`]) and a push-event channel
//! ([`events::EventBridge`]). Nothing in this crate talks to the network
//! directly.

pub mod events;
pub mod gateway;

use async_trait::async_trait;
use serde_json::Value;

pub use events::{EventBridge, Subscription};
pub use gateway::{CommandError, CommandGateway};

/// Request/response channel to the backend host.
///
/// Commands are invoked by name with a JSON argument bag and yield a single
/// JSON reply. Failure payloads are opaque JSON values; the gateway
/// normalises them before anything user-facing sees them. There is no way
/// to cancel an in-flight invocation, so callers must tolerate a stale
/// reply arriving after local state has moved on.
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, Value>;
}
