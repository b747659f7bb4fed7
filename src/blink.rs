//! Blink timer
//!
//! Flips the call store's blink flag at a fixed interval so pending and
//! urgent entries flash. Purely a rendering signal; stopping or restarting
//! the timer has no effect on call state.

use crate::config;
use crate::session::CallSessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn the blink task at the configured interval
/// (`calls.blink_interval_ms`). Aborting the returned handle stops the
/// timer.
pub fn spawn_blink_task(store: Arc<CallSessionStore>) -> JoinHandle<()> {
    let interval_ms = config::get_config().calls.blink_interval_ms.max(1);
    spawn_blink_task_with_interval(store, Duration::from_millis(interval_ms))
}

/// Spawn the blink task with an explicit interval.
pub fn spawn_blink_task_with_interval(
    store: Arc<CallSessionStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so the flag starts low.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            store.toggle_blink();
        }
    })
}
