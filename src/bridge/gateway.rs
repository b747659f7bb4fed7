//! Command gateway
//!
//! Invokes backend commands through the [`HostBridge`] in one of two modes.
//! Strict: surface the failure on the error overlay and propagate it, so
//! the caller can run its own recovery (e.g. rolling back an optimistic
//! accept). Safe: surface the failure and swallow it, for fire-and-forget
//! actions with no rollback logic. Either way a failure reaches the overlay
//! exactly once.

use super::HostBridge;
use crate::overlay::{ErrorOverlay, ErrorReport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a strict-mode command invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The backend reported a failure; already shown on the overlay.
    #[error("command `{command}` failed: {report}")]
    Backend { command: String, report: ErrorReport },
    /// The backend replied, but the payload did not decode.
    #[error("malformed reply for `{command}`: {source}")]
    MalformedReply {
        command: String,
        #[source]
        source: serde_json::Error,
    },
    /// The command arguments could not be serialised.
    #[error("invalid arguments for `{command}`: {source}")]
    InvalidArgs {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct CommandGateway {
    bridge: Arc<dyn HostBridge>,
    overlay: Arc<ErrorOverlay>,
}

impl CommandGateway {
    pub fn new(bridge: Arc<dyn HostBridge>, overlay: Arc<ErrorOverlay>) -> Self {
        Self { bridge, overlay }
    }

    pub fn overlay(&self) -> &Arc<ErrorOverlay> {
        &self.overlay
    }

    /// Invoke a command; on failure, surface the error and propagate it.
    pub async fn invoke_strict<T, A>(&self, command: &str, args: A) -> Result<T, CommandError>
    where
        T: DeserializeOwned,
        A: Serialize,
    {
        let args = serde_json::to_value(args).map_err(|source| {
            let err = CommandError::InvalidArgs {
                command: command.to_string(),
                source,
            };
            self.overlay
                .open(ErrorReport::new("Unexpected error", err.to_string()));
            err
        })?;

        tracing::debug!(%command, "invoking backend command");
        match self.bridge.invoke(command, args).await {
            Ok(reply) => self.decode_reply(command, reply),
            Err(failure) => {
                let report = ErrorReport::from_value(&failure);
                tracing::warn!(%command, %report, "backend command failed");
                self.overlay.open(report.clone());
                Err(CommandError::Backend {
                    command: command.to_string(),
                    report,
                })
            }
        }
    }

    /// Invoke a command; on failure, surface the error and return `None`.
    pub async fn invoke_safe<T, A>(&self, command: &str, args: A) -> Option<T>
    where
        T: DeserializeOwned,
        A: Serialize,
    {
        self.invoke_strict(command, args).await.ok()
    }

    fn decode_reply<T: DeserializeOwned>(
        &self,
        command: &str,
        reply: Value,
    ) -> Result<T, CommandError> {
        serde_json::from_value(reply).map_err(|source| {
            let err = CommandError::MalformedReply {
                command: command.to_string(),
                source,
            };
            tracing::error!(%command, error = %err, "reply decode failed");
            self.overlay
                .open(ErrorReport::new("Unexpected error", err.to_string()));
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Scripted bridge: replies per command name, records invocations.
    struct ScriptedBridge {
        replies: Mutex<std::collections::HashMap<String, Result<Value, Value>>>,
        invoked: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedBridge {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(std::collections::HashMap::new()),
                invoked: Mutex::new(Vec::new()),
            })
        }

        fn script(&self, command: &str, reply: Result<Value, Value>) {
            self.replies.lock().insert(command.to_string(), reply);
        }

        fn invocations(&self) -> Vec<(String, Value)> {
            self.invoked.lock().clone()
        }
    }

    #[async_trait]
    impl HostBridge for ScriptedBridge {
        async fn invoke(&self, command: &str, args: Value) -> Result<Value, Value> {
            self.invoked.lock().push((command.to_string(), args));
            self.replies
                .lock()
                .get(command)
                .cloned()
                .unwrap_or(Err(json!({"title": "Unknown command", "message": command})))
        }
    }

    fn gateway(bridge: Arc<ScriptedBridge>) -> (CommandGateway, Arc<ErrorOverlay>) {
        let overlay = ErrorOverlay::new();
        (CommandGateway::new(bridge, Arc::clone(&overlay)), overlay)
    }

    #[tokio::test]
    async fn test_strict_success_returns_typed_reply() {
        let bridge = ScriptedBridge::new();
        bridge.script("echo", Ok(json!({"value": 7})));
        let (gateway, overlay) = gateway(Arc::clone(&bridge));

        #[derive(serde::Deserialize)]
        struct Reply {
            value: u32,
        }

        let reply: Reply = gateway.invoke_strict("echo", json!({})).await.unwrap();
        assert_eq!(reply.value, 7);
        assert!(overlay.current().is_none());
    }

    #[tokio::test]
    async fn test_strict_failure_surfaces_once_and_propagates() {
        let bridge = ScriptedBridge::new();
        bridge.script(
            "signaling_accept_call",
            Err(json!({"title": "Signaling error", "message": "peer gone"})),
        );
        let (gateway, overlay) = gateway(Arc::clone(&bridge));

        let result: Result<(), _> = gateway
            .invoke_strict("signaling_accept_call", json!({"peerId": "a"}))
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, CommandError::Backend { .. }));
        assert_eq!(
            overlay.current().map(|e| e.title),
            Some("Signaling error".to_string())
        );
    }

    #[tokio::test]
    async fn test_safe_failure_surfaces_and_swallows() {
        let bridge = ScriptedBridge::new();
        bridge.script("audio_set_radio_prio", Err(json!("boom")));
        let (gateway, overlay) = gateway(Arc::clone(&bridge));

        let reply: Option<()> = gateway
            .invoke_safe("audio_set_radio_prio", json!({"prio": true}))
            .await;

        assert!(reply.is_none());
        // The unrecognised failure value was normalised.
        assert_eq!(overlay.current(), Some(ErrorReport::unexpected()));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_surfaced() {
        let bridge = ScriptedBridge::new();
        bridge.script("echo", Ok(json!("not a struct")));
        let (gateway, overlay) = gateway(Arc::clone(&bridge));

        #[derive(Debug, serde::Deserialize)]
        struct Reply {
            #[allow(dead_code)]
            value: u32,
        }

        let result: Result<Reply, _> = gateway.invoke_strict("echo", json!({})).await;
        assert!(matches!(
            result.unwrap_err(),
            CommandError::MalformedReply { .. }
        ));
        assert!(overlay.current().is_some());
    }

    #[tokio::test]
    async fn test_arguments_reach_the_bridge() {
        let bridge = ScriptedBridge::new();
        bridge.script("signaling_end_call", Ok(Value::Null));
        let (gateway, _) = gateway(Arc::clone(&bridge));

        let _: Option<()> = gateway
            .invoke_safe("signaling_end_call", json!({"peerId": "tower-1"}))
            .await;

        assert_eq!(
            bridge.invocations(),
            vec![(
                "signaling_end_call".to_string(),
                json!({"peerId": "tower-1"})
            )]
        );
    }
}
