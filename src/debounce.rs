//! Debounce guard for asynchronous operator actions
//!
//! A double-click or key repeat must not put two copies of the same command
//! in flight. Each guard owns one busy flag; while an invocation is
//! running, further invocations return immediately without touching any
//! state. The flag resets on every exit path, including panics and dropped
//! futures, and can be observed for disabling UI controls.

use scopeguard::guard;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Reentrancy guard: at most one wrapped invocation in flight per instance.
#[derive(Clone)]
pub struct DebounceGuard {
    busy: Arc<AtomicBool>,
    busy_tx: watch::Sender<bool>,
}

impl DebounceGuard {
    pub fn new() -> Self {
        let (busy_tx, _) = watch::channel(false);
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            busy_tx,
        }
    }

    /// Whether an invocation is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Observe the busy flag, e.g. to disable a button while in flight.
    pub fn busy_changes(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Run `action` unless one is already in flight, in which case nothing
    /// is invoked and `None` is returned.
    pub async fn run<F, Fut, T>(&self, action: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::trace!("debounced duplicate invocation");
            return None;
        }
        self.busy_tx.send_replace(true);

        // Reset fires on normal return, panic, and future cancellation.
        let reset = guard(
            (Arc::clone(&self.busy), self.busy_tx.clone()),
            |(busy, busy_tx)| {
                busy.store(false, Ordering::SeqCst);
                busy_tx.send_replace(false);
            },
        );

        let result = action().await;
        drop(reset);
        Some(result)
    }
}

impl Default for DebounceGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_invocations_run_once() {
        let guard = DebounceGuard::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (c1, c2) = (Arc::clone(&calls), Arc::clone(&calls));
        let first = guard.run(|| async move {
            c1.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            "first"
        });
        let second = guard.run(|| async move {
            c2.fetch_add(1, Ordering::SeqCst);
            "second"
        });

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, Some("first"));
        assert_eq!(second, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!guard.is_busy());
    }

    #[tokio::test]
    async fn test_sequential_invocations_all_run() {
        let guard = DebounceGuard::new();
        assert_eq!(guard.run(|| async { 1 }).await, Some(1));
        assert_eq!(guard.run(|| async { 2 }).await, Some(2));
    }

    #[tokio::test]
    async fn test_flag_resets_after_panic() {
        let guard = DebounceGuard::new();

        let inner = guard.clone();
        let task = tokio::spawn(async move {
            inner
                .run(|| async {
                    panic!("wrapped action failed");
                })
                .await
        });

        assert!(task.await.is_err());
        assert!(!guard.is_busy());
    }

    #[tokio::test]
    async fn test_flag_resets_when_future_dropped() {
        let guard = DebounceGuard::new();

        {
            let pending = guard.run(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
            tokio::pin!(pending);
            // Poll once so the guard engages, then drop mid-flight.
            tokio::select! {
                biased;
                _ = &mut pending => unreachable!("sleep cannot finish"),
                _ = tokio::task::yield_now() => {}
            }
            assert!(guard.is_busy());
        }

        assert!(!guard.is_busy());
    }

    #[tokio::test]
    async fn test_busy_flag_observable() {
        let guard = DebounceGuard::new();
        let busy_changes = guard.busy_changes();
        assert!(!*busy_changes.borrow());

        let observer = guard.clone();
        guard
            .run(|| async move {
                assert!(observer.is_busy());
            })
            .await;

        assert!(!*busy_changes.borrow());
    }

    #[tokio::test]
    async fn test_guards_are_independent() {
        let a = DebounceGuard::new();
        let b = DebounceGuard::new();

        let ran_b = a
            .run(|| async { b.run(|| async { true }).await })
            .await
            .flatten();
        assert_eq!(ran_b, Some(true));
    }
}
