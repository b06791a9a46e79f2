//! Analysis loop: periodic health checks plus error-triggered analysis
//!
//! Wakes on whichever comes first: the health-check interval or the
//! [`AnalysisTrigger`]. Only one request is in flight at a time, and after each
//! one the loop waits `min_gap` before it will wake again. Triggers fired in
//! the meantime collapse into a single follow-up request.

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::intelligence::{AnalysisTrigger, IntelligenceRequester};

/// Why the loop woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Health-check interval elapsed
    Periodic,
    /// Error tracking fired the trigger (count of merged fires)
    Triggered(u64),
}

impl std::fmt::Display for WakeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WakeReason::Periodic => write!(f, "periodic"),
            WakeReason::Triggered(n) => write!(f, "triggered x{n}"),
        }
    }
}

/// Drives an [`IntelligenceRequester`] from a timer and a trigger.
#[derive(Debug)]
pub struct AnalysisLoop {
    requester: IntelligenceRequester,
    trigger: AnalysisTrigger,
    interval: Duration,
    min_gap: Duration,
}

impl AnalysisLoop {
    pub fn new(
        requester: IntelligenceRequester,
        trigger: AnalysisTrigger,
        interval: Duration,
        min_gap: Duration,
    ) -> Self {
        Self {
            requester,
            trigger,
            interval,
            min_gap,
        }
    }

    pub fn from_config(
        requester: IntelligenceRequester,
        trigger: AnalysisTrigger,
        config: &AnalysisConfig,
    ) -> Self {
        Self::new(
            requester,
            trigger,
            config.health_check_interval(),
            config.min_request_gap(),
        )
    }

    /// Run until `cancel` fires. Call from `tokio::spawn`.
    ///
    /// Returns the number of analysis requests made.
    pub async fn run(self, cancel: CancellationToken) -> u64 {
        info!(
            interval_secs = self.interval.as_secs(),
            min_gap_ms = self.min_gap.as_millis() as u64,
            "Analysis loop started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick is immediate; health checks start one interval in.
        ticker.tick().await;

        let mut requests = 0u64;
        loop {
            let periodic = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => true,
                () = self.trigger.fired() => false,
            };
            let Some(reason) = self.settle_wake(periodic) else {
                debug!("Trigger permit already covered by the previous request, skipping");
                continue;
            };

            debug!(reason = %reason, "Analysis loop woke");
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = self.requester.request_intelligence_analysis() => {}
            }
            requests += 1;

            if !self.min_gap.is_zero() {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(self.min_gap) => {}
                }
            }
        }

        info!(requests, "Analysis loop stopped");
        requests
    }

    /// Consume the fires this wake-up answers for.
    ///
    /// Any request snapshots every error recorded so far, so a periodic wake
    /// clears the pending count too. A trigger wake with nothing pending is a
    /// leftover permit and yields `None`.
    fn settle_wake(&self, periodic: bool) -> Option<WakeReason> {
        let pending = self.trigger.take_pending();
        match (periodic, pending) {
            (true, _) => Some(WakeReason::Periodic),
            (false, 0) => None,
            (false, n) => Some(WakeReason::Triggered(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::healing::{HealingBus, HealingDispatcher};
    use crate::intelligence::{AnalysisError, AnalysisResponse, AnalysisService};
    use crate::store::MetricsStore;
    use crate::types::DashboardState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingService {
        calls: AtomicUsize,
        errors_seen: std::sync::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl AnalysisService for CountingService {
        async fn analyze(&self, snapshot: &DashboardState) -> Result<AnalysisResponse, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.errors_seen
                .lock()
                .unwrap()
                .push(snapshot.render_errors.len());
            Ok(AnalysisResponse::default())
        }
    }

    fn setup(
        interval: Duration,
        min_gap: Duration,
    ) -> (AnalysisLoop, MetricsStore, Arc<CountingService>) {
        let trigger = AnalysisTrigger::new();
        let store = MetricsStore::with_trigger(10, trigger.clone());
        let service = Arc::new(CountingService::default());
        let requester = IntelligenceRequester::new(
            store.clone(),
            service.clone(),
            HealingDispatcher::new(HealingBus::new(8)),
        );
        (AnalysisLoop::new(requester, trigger, interval, min_gap), store, service)
    }

    fn render_error(name: &str) -> crate::types::RenderError {
        crate::types::RenderError {
            component: name.to_string(),
            message: "boom".to_string(),
            stack: None,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_tick_requests_analysis() {
        let (analysis_loop, _store, service) =
            setup(Duration::from_secs(60), Duration::ZERO);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(analysis_loop.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn error_burst_coalesces_into_one_request() {
        let (analysis_loop, store, service) =
            setup(Duration::from_secs(3600), Duration::from_secs(2));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(analysis_loop.run(cancel.clone()));
        tokio::task::yield_now().await;

        for name in ["A", "B", "C", "D", "E"] {
            store.record_render_error(render_error(name));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        // Fired inside the gap: held back, then served as one request
        store.record_render_error(render_error("F"));
        store.record_render_error(render_error("G"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*service.errors_seen.lock().unwrap(), vec![5, 7]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn periodic_wake_clears_pending_fires() {
        let (analysis_loop, store, _service) = setup(Duration::from_secs(60), Duration::ZERO);
        store.record_render_error(render_error("A"));
        store.record_render_error(render_error("B"));

        assert_eq!(analysis_loop.settle_wake(true), Some(WakeReason::Periodic));
        assert_eq!(analysis_loop.settle_wake(false), None);

        store.record_render_error(render_error("C"));
        assert_eq!(analysis_loop.settle_wake(false), Some(WakeReason::Triggered(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_request_absorbs_errors_fired_during_the_gap() {
        let (analysis_loop, store, service) =
            setup(Duration::from_secs(20), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(analysis_loop.run(cancel.clone()));
        tokio::task::yield_now().await;

        // t=17: triggered request, gap until t=22 (the t=20 tick is missed)
        tokio::time::sleep(Duration::from_secs(17)).await;
        store.record_render_error(render_error("A"));
        // t=18: fired inside the gap, leaves a stored permit
        tokio::time::sleep(Duration::from_secs(1)).await;
        store.record_render_error(render_error("B"));

        // t=22: the delayed tick wins and its request already carries "B"
        tokio::time::sleep(Duration::from_secs(17)).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*service.errors_seen.lock().unwrap(), vec![1, 2]);

        // t=42: next tick
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn cancel_stops_an_idle_loop() {
        let (analysis_loop, _store, service) =
            setup(Duration::from_secs(3600), Duration::ZERO);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(analysis_loop.run(cancel.clone()));
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), 0);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }
}
