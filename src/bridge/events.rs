//! Event bridge
//!
//! Push-notification side of the host bridge. The host integration pumps
//! each backend notification into [`EventBridge::emit`]; components listen
//! on named channels and get their payloads decoded to a typed value.
//! Multiple listeners per channel fan out independently, and every
//! [`Subscription`] tears down on drop. Notifications are delivered in
//! emit order per channel; nothing is guaranteed across channels.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct Registry {
    channels: Mutex<HashMap<String, Vec<(u64, Handler)>>>,
    next_id: AtomicU64,
}

/// Fan-out dispatcher for named backend push channels.
#[derive(Clone, Default)]
pub struct EventBridge {
    registry: Arc<Registry>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen on a channel, decoding each payload to `T`.
    ///
    /// Payloads that fail to decode are logged and dropped; the handler is
    /// only ever called with well-formed values. Payload-less channels
    /// decode as `()`.
    pub fn listen<T, F>(&self, channel: &str, handler: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::SeqCst);
        let channel_name = channel.to_string();
        let decode_channel = channel_name.clone();

        let decoding: Handler = Arc::new(move |payload: &Value| {
            match serde_json::from_value::<T>(payload.clone()) {
                Ok(value) => handler(value),
                Err(err) => {
                    tracing::warn!(channel = %decode_channel, %err, "dropping undecodable event payload");
                }
            }
        });

        self.registry
            .channels
            .lock()
            .entry(channel_name.clone())
            .or_default()
            .push((id, decoding));

        tracing::trace!(%channel, id, "event listener registered");
        Subscription {
            channel: channel_name,
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver a backend notification to every listener of `channel`.
    /// Returns the number of listeners the payload was handed to.
    pub fn emit(&self, channel: &str, payload: Value) -> usize {
        let handlers: Vec<Handler> = {
            let channels = self.registry.channels.lock();
            match channels.get(channel) {
                Some(entries) => entries.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => Vec::new(),
            }
        };

        if handlers.is_empty() {
            tracing::trace!(%channel, "event with no listeners dropped");
            return 0;
        }

        for handler in &handlers {
            handler(&payload);
        }
        handlers.len()
    }
}

/// Capability to stop listening. Unlistens on drop; calling
/// [`Subscription::unlisten`] repeatedly is a no-op, so teardown racing a
/// scope drop is safe.
pub struct Subscription {
    channel: String,
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn unlisten(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut channels = registry.channels.lock();
        if let Some(entries) = channels.get_mut(&self.channel) {
            let before = entries.len();
            entries.retain(|(id, _)| *id != self.id);
            if entries.len() != before {
                tracing::trace!(channel = %self.channel, id = self.id, "event listener released");
            }
            if entries.is_empty() {
                channels.remove(&self.channel);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unlisten();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_listener_receives_decoded_payload() {
        let bridge = EventBridge::new();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = bridge.listen::<String, _>("webrtc:call-error", move |peer_id| {
            sink.lock().push(peer_id);
        });

        assert_eq!(bridge.emit("webrtc:call-error", json!("peer-1")), 1);
        assert_eq!(*seen.lock(), vec!["peer-1".to_string()]);
    }

    #[test]
    fn test_fan_out_to_independent_listeners() {
        let bridge = EventBridge::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let a = Arc::clone(&first);
        let sub_a = bridge.listen::<bool, _>("audio:implicit-radio-prio", move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&second);
        let _sub_b = bridge.listen::<bool, _>("audio:implicit-radio-prio", move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });

        bridge.emit("audio:implicit-radio-prio", json!(true));
        sub_a.unlisten();
        bridge.emit("audio:implicit-radio-prio", json!(false));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_double_unlisten_is_noop() {
        let bridge = EventBridge::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let sub = bridge.listen::<(), _>("auth:unauthenticated", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sub.unlisten();
        sub.unlisten();
        drop(sub);

        assert_eq!(bridge.emit("auth:unauthenticated", Value::Null), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let bridge = EventBridge::new();
        {
            let _sub = bridge.listen::<String, _>("auth:authenticated", |_| {});
            assert_eq!(bridge.emit("auth:authenticated", json!("cid")), 1);
        }
        assert_eq!(bridge.emit("auth:authenticated", json!("cid")), 0);
    }

    #[test]
    fn test_undecodable_payload_dropped_silently() {
        let bridge = EventBridge::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let _sub = bridge.listen::<bool, _>("audio:implicit-radio-prio", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bridge.emit("audio:implicit-radio-prio", json!({"not": "a bool"}));
        bridge.emit("audio:implicit-radio-prio", json!(true));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_per_channel_delivery_order() {
        let bridge = EventBridge::new();
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = bridge.listen::<u32, _>("counter", move |n| {
            sink.lock().push(n);
        });

        for n in 0..5 {
            bridge.emit("counter", json!(n));
        }
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_emit_on_unknown_channel_is_noop() {
        let bridge = EventBridge::new();
        assert_eq!(bridge.emit("nobody:listens", json!(1)), 0);
    }
}
