//! Wiring: one session's store, tracker, bus, dispatcher and requester

use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::background::{record_startup_metrics, AnalysisLoop};
use crate::config::IntelConfig;
use crate::healing::{HealingBus, HealingDispatcher};
use crate::intelligence::{
    AnalysisError, AnalysisService, AnalysisTrigger, HttpAnalysisService, IntelligenceRequester,
};
use crate::store::MetricsStore;
use crate::subscriber::{ErrorBoundary, FallbackView, MonitoredQuery};
use crate::tracker::ErrorTracker;

/// Everything a dashboard session needs, built once and shared by handle.
#[derive(Debug, Clone)]
pub struct DashboardIntelligence {
    config: Arc<IntelConfig>,
    store: MetricsStore,
    tracker: ErrorTracker,
    bus: HealingBus,
    trigger: AnalysisTrigger,
    requester: IntelligenceRequester,
}

impl DashboardIntelligence {
    /// Build with the HTTP analysis client described by `config.analysis`.
    pub fn new(config: IntelConfig) -> Result<Self, AnalysisError> {
        let service = HttpAnalysisService::new(&config.analysis)?;
        Ok(Self::with_service(config, Arc::new(service)))
    }

    /// Build around any [`AnalysisService`].
    pub fn with_service(config: IntelConfig, service: Arc<dyn AnalysisService>) -> Self {
        let trigger = AnalysisTrigger::new();
        let store = MetricsStore::with_trigger(config.store.error_capacity, trigger.clone());
        let tracker = ErrorTracker::new(store.clone());
        let bus = HealingBus::new(config.events.channel_capacity);
        let requester =
            IntelligenceRequester::new(store.clone(), service, HealingDispatcher::new(bus.clone()));

        Self {
            config: Arc::new(config),
            store,
            tracker,
            bus,
            trigger,
            requester,
        }
    }

    pub fn config(&self) -> &IntelConfig {
        &self.config
    }

    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    pub fn tracker(&self) -> &ErrorTracker {
        &self.tracker
    }

    pub fn bus(&self) -> &HealingBus {
        &self.bus
    }

    pub fn trigger(&self) -> &AnalysisTrigger {
        &self.trigger
    }

    pub fn requester(&self) -> &IntelligenceRequester {
        &self.requester
    }

    /// Record startup metrics and spawn the analysis loop.
    pub fn start(&self, started: Instant, cancel: CancellationToken) -> JoinHandle<u64> {
        record_startup_metrics(&self.tracker, started);
        let analysis_loop =
            AnalysisLoop::from_config(self.requester.clone(), self.trigger.clone(), &self.config.analysis);
        tokio::spawn(analysis_loop.run(cancel))
    }

    pub fn error_boundary(&self, component: impl Into<String>) -> ErrorBoundary {
        ErrorBoundary::new(component, self.tracker.clone(), &self.bus)
    }

    pub fn monitored_query<T: Clone>(&self, key: impl Into<String>) -> MonitoredQuery<T> {
        MonitoredQuery::new(key, self.tracker.clone(), &self.bus)
    }

    pub fn fallback_view<T>(&self, component: impl Into<String>, fallback: T) -> FallbackView<T> {
        FallbackView::new(component, fallback, &self.bus)
    }
}
