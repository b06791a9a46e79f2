//! Metrics Store
//!
//! Owns the session's [`DashboardState`]. Every mutation takes the lock,
//! applies, and releases before returning, so mutations never interleave and
//! a subsequent read always sees them. Error-recording mutations also fire
//! the [`AnalysisTrigger`] without waiting on it.

use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use crate::intelligence::AnalysisTrigger;
use crate::types::{
    validate_dataset_name, ApiError, DashboardState, DatasetError, PerformanceMetric, RenderError,
};

/// Cheaply cloneable handle to the session's dashboard state.
#[derive(Debug, Clone)]
pub struct MetricsStore {
    state: Arc<Mutex<DashboardState>>,
    trigger: Option<AnalysisTrigger>,
}

impl MetricsStore {
    /// A store with no analysis wired up. Error recording only appends.
    pub fn new(error_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(DashboardState::new(error_capacity))),
            trigger: None,
        }
    }

    /// A store that fires `trigger` on every recorded error.
    pub fn with_trigger(error_capacity: usize, trigger: AnalysisTrigger) -> Self {
        Self {
            trigger: Some(trigger),
            ..Self::new(error_capacity)
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("Dashboard state mutex poisoned, recovering");
            e.into_inner()
        })
    }

    fn fire_trigger(&self) {
        if let Some(trigger) = &self.trigger {
            trigger.fire();
        }
    }

    /// Append a render error, evicting the oldest one past capacity.
    ///
    /// Returns the evicted entry, if any.
    pub fn record_render_error(&self, error: RenderError) -> Option<RenderError> {
        let evicted = self.lock().render_errors.push(error);
        self.fire_trigger();
        evicted
    }

    /// Append an API error, evicting the oldest one past capacity.
    pub fn record_api_error(&self, error: ApiError) -> Option<ApiError> {
        let evicted = self.lock().api_errors.push(error);
        self.fire_trigger();
        evicted
    }

    pub fn set_performance(&self, metric: PerformanceMetric, value: f64) {
        let mut state = self.lock();
        let metrics = &mut state.performance_metrics;
        match metric {
            PerformanceMetric::LoadTime => metrics.load_time = value,
            PerformanceMetric::MemoryUsage => metrics.memory_usage = value,
            PerformanceMetric::RenderTime => metrics.render_time = value,
        }
    }

    pub fn set_api_response_time(&self, endpoint: &str, time_ms: f64) {
        self.lock()
            .performance_metrics
            .api_response_times
            .insert(endpoint.to_string(), time_ms);
    }

    /// Replace a named dataset (`salesData`, `customersData`, ...).
    ///
    /// Names of the snapshot's own fields are rejected, since datasets share
    /// the top level of the serialized state with them.
    pub fn replace_dataset(&self, name: &str, rows: Vec<Value>) -> Result<(), DatasetError> {
        validate_dataset_name(name)?;
        self.lock().datasets.insert(name.to_string(), rows);
        Ok(())
    }

    pub fn replace_component_state(&self, component: &str, state: Value) {
        self.lock()
            .component_state
            .insert(component.to_string(), state);
    }

    /// Empty both error logs. Metrics, datasets and component state stay.
    pub fn clear_errors(&self) {
        let mut state = self.lock();
        state.render_errors.clear();
        state.api_errors.clear();
    }

    /// Copy of the full state as of this call.
    pub fn snapshot(&self) -> DashboardState {
        self.lock().clone()
    }

    pub fn error_count(&self) -> usize {
        self.lock().error_count()
    }

    pub fn error_capacity(&self) -> usize {
        self.lock().render_errors.capacity()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(crate::config::defaults::ERROR_LOG_CAPACITY)
    }
}
