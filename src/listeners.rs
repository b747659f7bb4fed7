//! Push-channel wiring
//!
//! Connects the [`EventBridge`] channels to the stores. Each setup function
//! returns its subscriptions; hold on to the aggregate [`Listeners`] for as
//! long as the console runs, since dropping it releases every channel.
//!
//! Ordering is only guaranteed within a channel. Cross-channel races (for
//! example a call-error push against a roster removal) are absorbed by the
//! store's idempotent methods, which converge to the same terminal state
//! either way.

use crate::audio::AudioControl;
use crate::auth::AuthStore;
use crate::bridge::{EventBridge, Subscription};
use crate::calllog::{CallDirection, CallLog};
use crate::peer::{ConnectionState, Peer};
use crate::session::CallSessionStore;
use crate::signaling::SignalingStore;
use std::sync::Arc;

/// Channel names, matching the backend's emitter.
pub mod channels {
    /// Payload: peer id whose call transport failed
    pub const WEBRTC_CALL_ERROR: &str = "webrtc:call-error";
    /// Payload: [`crate::peer::ConnectionState`] of the live call
    pub const WEBRTC_CONNECTION_STATE: &str = "webrtc:connection-state";
    /// Payload: authenticated client id
    pub const AUTH_AUTHENTICATED: &str = "auth:authenticated";
    /// No payload
    pub const AUTH_UNAUTHENTICATED: &str = "auth:unauthenticated";
    /// Payload: whether the backend engaged radio priority on its own
    pub const AUDIO_IMPLICIT_RADIO_PRIO: &str = "audio:implicit-radio-prio";
    /// Payload: the operator's own display name on the network
    pub const SIGNALING_CONNECTED: &str = "signaling:connected";
    /// No payload
    pub const SIGNALING_DISCONNECTED: &str = "signaling:disconnected";
    /// Payload: full roster of reachable clients, sent after (re)connecting
    pub const SIGNALING_CLIENTS: &str = "signaling:clients";
    /// Payload: [`crate::peer::Peer`] that joined the network
    pub const SIGNALING_CLIENT_CONNECTED: &str = "signaling:client-connected";
    /// Payload: id of the client that left
    pub const SIGNALING_CLIENT_DISCONNECTED: &str = "signaling:client-disconnected";
    /// Payload: [`crate::peer::Peer`] ringing the operator
    pub const SIGNALING_CALL_RECEIVED: &str = "signaling:call-received";
    /// Payload: peer id that picked up our outgoing call
    pub const SIGNALING_CALL_ACCEPTED: &str = "signaling:call-accepted";
    /// Payload: peer id that declined our outgoing call
    pub const SIGNALING_CALL_REJECTED: &str = "signaling:call-rejected";
}

/// Reason recorded when the transport reports a failed call. The push
/// payload carries only the peer id.
const CALL_ERROR_REASON: &str = "call transport failure";

/// All live channel subscriptions; releases them on drop.
pub struct Listeners {
    subscriptions: Vec<Subscription>,
}

impl Listeners {
    /// Wire every channel to its store.
    pub fn attach(
        bridge: &EventBridge,
        store: &Arc<CallSessionStore>,
        signaling: &Arc<SignalingStore>,
        auth: &Arc<AuthStore>,
        audio: &Arc<AudioControl>,
        log: &Arc<CallLog>,
    ) -> Self {
        let mut subscriptions = setup_webrtc_listeners(bridge, store);
        subscriptions.extend(setup_signaling_listeners(bridge, signaling, store, log));
        subscriptions.extend(setup_auth_listeners(bridge, auth));
        subscriptions.extend(setup_audio_listeners(bridge, audio));
        Self { subscriptions }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Explicit release; equivalent to dropping.
    pub fn release(self) {}
}

/// Transport-health pushes feeding the call display.
pub fn setup_webrtc_listeners(
    bridge: &EventBridge,
    store: &Arc<CallSessionStore>,
) -> Vec<Subscription> {
    let error_store = Arc::clone(store);
    let state_store = Arc::clone(store);
    vec![
        bridge.listen::<String, _>(channels::WEBRTC_CALL_ERROR, move |peer_id| {
            tracing::debug!(%peer_id, "webrtc call error pushed");
            error_store.error_peer(&peer_id, CALL_ERROR_REASON);
        }),
        bridge.listen::<ConnectionState, _>(channels::WEBRTC_CONNECTION_STATE, move |state| {
            state_store.set_connection_state(state);
        }),
    ]
}

/// Roster and call-lifecycle pushes from the signaling backend.
pub fn setup_signaling_listeners(
    bridge: &EventBridge,
    signaling: &Arc<SignalingStore>,
    store: &Arc<CallSessionStore>,
    log: &Arc<CallLog>,
) -> Vec<Subscription> {
    let link_up = Arc::clone(signaling);
    let link_down = Arc::clone(signaling);
    let roster = Arc::clone(signaling);
    let joined = Arc::clone(signaling);
    let left_roster = Arc::clone(signaling);
    let left_calls = Arc::clone(store);
    let ringing_store = Arc::clone(store);
    let ringing_log = Arc::clone(log);
    let accepted = Arc::clone(store);
    let rejected = Arc::clone(store);

    vec![
        bridge.listen::<String, _>(channels::SIGNALING_CONNECTED, move |display_name| {
            link_up.set_display_name(display_name);
            link_up.set_connected(true);
        }),
        bridge.listen::<(), _>(channels::SIGNALING_DISCONNECTED, move |()| {
            // Nobody is reachable until the next roster push.
            link_down.set_connected(false);
            link_down.set_clients(Vec::new());
        }),
        bridge.listen::<Vec<Peer>, _>(channels::SIGNALING_CLIENTS, move |clients| {
            roster.set_clients(clients);
        }),
        bridge.listen::<Peer, _>(channels::SIGNALING_CLIENT_CONNECTED, move |client| {
            joined.add_client(client);
        }),
        bridge.listen::<String, _>(channels::SIGNALING_CLIENT_DISCONNECTED, move |id| {
            // A vanished client can no longer ring or be on a call.
            left_roster.remove_client(&id);
            left_calls.remove_peer(&id);
        }),
        bridge.listen::<Peer, _>(channels::SIGNALING_CALL_RECEIVED, move |peer| {
            if ringing_store.add_incoming(peer.clone()) {
                ringing_log.record(CallDirection::Incoming, peer.display_name, peer.frequency);
            }
        }),
        bridge.listen::<String, _>(channels::SIGNALING_CALL_ACCEPTED, move |peer_id| {
            accepted.confirm_outgoing(&peer_id);
        }),
        bridge.listen::<String, _>(channels::SIGNALING_CALL_REJECTED, move |peer_id| {
            rejected.reject_outgoing(&peer_id);
        }),
    ]
}

pub fn setup_auth_listeners(bridge: &EventBridge, auth: &Arc<AuthStore>) -> Vec<Subscription> {
    let authenticated = Arc::clone(auth);
    let unauthenticated = Arc::clone(auth);
    vec![
        bridge.listen::<String, _>(channels::AUTH_AUTHENTICATED, move |cid| {
            authenticated.set_authenticated(cid);
        }),
        bridge.listen::<(), _>(channels::AUTH_UNAUTHENTICATED, move |()| {
            unauthenticated.set_unauthenticated();
        }),
    ]
}

pub fn setup_audio_listeners(bridge: &EventBridge, audio: &Arc<AudioControl>) -> Vec<Subscription> {
    let control = Arc::clone(audio);
    vec![bridge.listen::<bool, _>(
        channels::AUDIO_IMPLICIT_RADIO_PRIO,
        move |prio| {
            control.apply_implicit_radio_prio(prio);
        },
    )]
}
