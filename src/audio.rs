//! Audio control surface
//!
//! Radio-priority and input-mute toggles. These are fire-and-forget from
//! the console's point of view: the commands go out in safe mode (a failure
//! shows on the error overlay and the toggle simply does not take), and the
//! backend may also flip radio priority implicitly, pushed back via
//! `audio:implicit-radio-prio`.

use crate::bridge::CommandGateway;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};

/// Backend command: give radio traffic priority over the call.
pub const CMD_SET_RADIO_PRIO: &str = "audio_set_radio_prio";
/// Backend command: mute/unmute the operator's input.
pub const CMD_SET_INPUT_MUTED: &str = "audio_set_input_muted";

/// Mirror of the backend's audio toggles.
#[derive(Debug, Default)]
pub struct AudioControl {
    radio_prio: AtomicBool,
    input_muted: AtomicBool,
}

impl AudioControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radio_prio(&self) -> bool {
        self.radio_prio.load(Ordering::SeqCst)
    }

    pub fn input_muted(&self) -> bool {
        self.input_muted.load(Ordering::SeqCst)
    }

    /// Request radio priority; the local flag only follows a confirmed
    /// command, there is no optimistic flip to roll back.
    pub async fn set_radio_prio(&self, gateway: &CommandGateway, prio: bool) {
        if gateway
            .invoke_safe::<(), _>(CMD_SET_RADIO_PRIO, json!({ "prio": prio }))
            .await
            .is_some()
        {
            self.radio_prio.store(prio, Ordering::SeqCst);
            tracing::debug!(prio, "radio priority set");
        }
    }

    pub async fn set_input_muted(&self, gateway: &CommandGateway, muted: bool) {
        if gateway
            .invoke_safe::<(), _>(CMD_SET_INPUT_MUTED, json!({ "muted": muted }))
            .await
            .is_some()
        {
            self.input_muted.store(muted, Ordering::SeqCst);
            tracing::debug!(muted, "input mute set");
        }
    }

    /// Backend flipped radio priority on its own (e.g. for an urgent radio
    /// transmission); no command goes out.
    pub fn apply_implicit_radio_prio(&self, prio: bool) {
        self.radio_prio.store(prio, Ordering::SeqCst);
        tracing::debug!(prio, "implicit radio priority applied");
    }
}
