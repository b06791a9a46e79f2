//! Coalescing trigger between error tracking and the analysis loop

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Fire-and-forget signal asking for an analysis pass.
///
/// Firing never blocks and never waits for the analysis. Any number of fires
/// that happen before the analysis loop wakes up collapse into a single
/// wake-up; [`AnalysisTrigger::take_pending`] reports how many were merged.
#[derive(Debug, Clone, Default)]
pub struct AnalysisTrigger {
    inner: Arc<TriggerInner>,
}

#[derive(Debug, Default)]
struct TriggerInner {
    notify: Notify,
    pending: AtomicU64,
    total: AtomicU64,
}

impl AnalysisTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an analysis pass.
    pub fn fire(&self) {
        self.inner.pending.fetch_add(1, Ordering::Relaxed);
        self.inner.total.fetch_add(1, Ordering::Relaxed);
        self.inner.notify.notify_one();
    }

    /// Wait until at least one fire has happened since the last wake-up.
    pub async fn fired(&self) {
        self.inner.notify.notified().await;
    }

    /// Number of fires since the previous call, resetting the counter.
    pub fn take_pending(&self) -> u64 {
        self.inner.pending.swap(0, Ordering::Relaxed)
    }

    /// Fires since creation.
    pub fn total_fired(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn burst_of_fires_wakes_once() {
        let trigger = AnalysisTrigger::new();
        for _ in 0..5 {
            trigger.fire();
        }

        tokio::time::timeout(Duration::from_millis(100), trigger.fired())
            .await
            .expect("stored permit should wake immediately");
        assert_eq!(trigger.take_pending(), 5);

        // The burst left only one permit behind
        let second = tokio::time::timeout(Duration::from_millis(50), trigger.fired()).await;
        assert!(second.is_err());
        assert_eq!(trigger.total_fired(), 5);
    }
}
