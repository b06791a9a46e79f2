//! Intelligence Requester
//!
//! Snapshot the store, ask the analysis service, hand the answer to the
//! dispatcher. Failures are logged and swallowed: the dashboard keeps working
//! uninstrumented rather than erroring because its health check did.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::client::{AnalysisResponse, AnalysisService};
use crate::healing::HealingDispatcher;
use crate::store::MetricsStore;

/// Counters exposed on the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterStats {
    pub requests: u64,
    pub failures: u64,
    pub recommendations_dispatched: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<String>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    failures: AtomicU64,
    dispatched: AtomicU64,
    last: Mutex<(Option<DateTime<Utc>>, Option<String>)>,
}

/// Sends store snapshots to an [`AnalysisService`].
#[derive(Clone)]
pub struct IntelligenceRequester {
    store: MetricsStore,
    service: Arc<dyn AnalysisService>,
    dispatcher: HealingDispatcher,
    counters: Arc<Counters>,
}

impl IntelligenceRequester {
    pub fn new(
        store: MetricsStore,
        service: Arc<dyn AnalysisService>,
        dispatcher: HealingDispatcher,
    ) -> Self {
        Self {
            store,
            service,
            dispatcher,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Run one analysis round trip.
    ///
    /// The snapshot is taken before the request is sent; later mutations are
    /// not part of this request. Returns `None` on any failure, never retries.
    pub async fn request_intelligence_analysis(&self) -> Option<AnalysisResponse> {
        let request_id = Uuid::new_v4();
        let snapshot = self.store.snapshot();
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        debug!(
            %request_id,
            render_errors = snapshot.render_errors.len(),
            api_errors = snapshot.api_errors.len(),
            "Requesting dashboard intelligence"
        );

        let started = Instant::now();
        match self.service.analyze(&snapshot).await {
            Ok(response) => {
                let report = self.dispatcher.apply_raw(&response.recommendations);
                self.counters
                    .dispatched
                    .fetch_add(report.dispatched as u64, Ordering::Relaxed);
                self.record_outcome(Ok(()));
                info!(
                    %request_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    dispatched = report.dispatched,
                    rejected = report.rejected,
                    "Dashboard intelligence received"
                );
                Some(response)
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%request_id, error = %e, "Error requesting dashboard intelligence");
                self.record_outcome(Err(e.to_string()));
                None
            }
        }
    }

    fn record_outcome(&self, outcome: Result<(), String>) {
        let mut last = self.counters.last.lock().unwrap_or_else(|e| e.into_inner());
        match outcome {
            Ok(()) => last.0 = Some(Utc::now()),
            Err(msg) => last.1 = Some(msg),
        }
    }

    pub fn stats(&self) -> RequesterStats {
        let last = self.counters.last.lock().unwrap_or_else(|e| e.into_inner());
        RequesterStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            recommendations_dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            last_success: last.0,
            last_failure: last.1.clone(),
        }
    }

    pub fn store(&self) -> &MetricsStore {
        &self.store
    }
}

impl std::fmt::Debug for IntelligenceRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntelligenceRequester")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
