//! Process-wide error overlay
//!
//! Holds at most one visible error at a time. Every backend failure,
//! whatever component triggered it, funnels through here exactly once;
//! components never render their own duplicate error UI. Failure values
//! that do not match the expected report shape are normalised to a generic
//! report and the raw value is logged for diagnostics.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// A single displayable error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub title: String,
    pub message: String,
    /// Non-critical errors are styled less aggressively by the UI
    #[serde(default)]
    pub non_critical: bool,
    /// Auto-dismiss delay; `None` keeps the error until replaced or closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ErrorReport {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            non_critical: false,
            timeout_ms: None,
        }
    }

    /// The generic report shown for failure values of unknown shape.
    pub fn unexpected() -> Self {
        Self::new("Unexpected error", "An unknown error occurred")
    }

    /// Normalise an arbitrary backend failure value. Values matching the
    /// report shape pass through; anything else is logged raw and replaced
    /// with [`ErrorReport::unexpected`].
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(report) => report,
            Err(_) => {
                tracing::error!(raw = %value, "unrecognised backend failure value");
                Self::unexpected()
            }
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// The overlay state: at most one active error, replace-on-open semantics,
/// optional auto-dismiss.
pub struct ErrorOverlay {
    active: Mutex<Option<(u64, ErrorReport)>>,
    generation: AtomicU64,
    changes_tx: watch::Sender<Option<ErrorReport>>,
}

impl ErrorOverlay {
    pub fn new() -> Arc<Self> {
        let (changes_tx, _) = watch::channel(None);
        Arc::new(Self {
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
            changes_tx,
        })
    }

    /// Show an error, replacing any error currently displayed. If the
    /// report carries a timeout, the error auto-clears after that delay
    /// unless it has been replaced or closed sooner. Non-critical reports
    /// without their own timeout fall back to the configured default
    /// (`overlay.non_critical_timeout_ms`, 0 meaning keep until closed).
    pub fn open(self: &Arc<Self>, report: ErrorReport) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(title = %report.title, non_critical = report.non_critical, "error overlay opened");

        let timeout_ms = report.timeout_ms.or_else(|| {
            if report.non_critical {
                let default_ms = crate::config::get_config().overlay.non_critical_timeout_ms;
                (default_ms > 0).then_some(default_ms)
            } else {
                None
            }
        });

        *self.active.lock() = Some((generation, report.clone()));
        self.changes_tx.send_replace(Some(report));

        if let Some(timeout_ms) = timeout_ms {
            self.spawn_dismiss_timer(generation, timeout_ms);
        }
    }

    /// Normalise-and-open for raw failure values from the host bridge.
    pub fn open_from_value(self: &Arc<Self>, value: &Value) {
        self.open(ErrorReport::from_value(value));
    }

    /// Clear the overlay unconditionally.
    pub fn close(&self) {
        if self.active.lock().take().is_some() {
            tracing::debug!("error overlay closed");
            self.changes_tx.send_replace(None);
        }
    }

    /// The currently displayed error, if any.
    pub fn current(&self) -> Option<ErrorReport> {
        self.active.lock().as_ref().map(|(_, report)| report.clone())
    }

    /// Observe overlay changes; for binding the rendering layer.
    pub fn changes(&self) -> watch::Receiver<Option<ErrorReport>> {
        self.changes_tx.subscribe()
    }

    fn spawn_dismiss_timer(self: &Arc<Self>, generation: u64, timeout_ms: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, error overlay timeout ignored");
            return;
        };
        let overlay = Arc::clone(self);
        handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            overlay.close_if_generation(generation);
        });
    }

    /// Clears the overlay only if the timed-out error is still the one on
    /// display; a replacement that arrived in the meantime stays up.
    fn close_if_generation(&self, generation: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|(gen, _)| *gen == generation) {
            *active = None;
            drop(active);
            tracing::debug!("error overlay auto-dismissed");
            self.changes_tx.send_replace(None);
        }
    }
}
