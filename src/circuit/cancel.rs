//! Explicit cancellation for an execution context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Cancel signal shared by a context and everything derived from it.
///
/// Executions subscribe when they start. The flag makes a cancel that
/// happened before the subscription still count.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: broadcast::Sender<()>,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Interrupt every execution running under this handle.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Number of executions currently waiting on this handle.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Resolves once `cancel` has been called.
    pub(crate) async fn cancelled(&self) {
        // Subscribe before reading the flag so a concurrent cancel is not lost.
        let mut rx = self.tx.subscribe();
        if self.is_cancelled() {
            return;
        }
        // Lagged still means a cancel was sent; Closed cannot happen while
        // `self` holds a sender.
        let _ = rx.recv().await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiter() {
        let handle = CancelHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        while handle.receiver_count() == 0 {
            tokio::task::yield_now().await;
        }
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_before_subscribe_is_seen() {
        let handle = CancelHandle::new();
        handle.cancel();
        assert!(handle.is_cancelled());

        tokio::time::timeout(Duration::from_millis(100), handle.cancelled())
            .await
            .expect("earlier cancel should count");
    }
}
