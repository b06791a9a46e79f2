//! Error Trackers
//!
//! Entry points that turn caught failures into [`RenderError`] / [`ApiError`]
//! records, plus [`ErrorTracker::instrument`] for timing fallible calls.
//! Tracking returns as soon as the record is appended; the analysis it
//! triggers runs elsewhere.

use chrono::Utc;
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tracing::error;

use crate::store::MetricsStore;
use crate::types::{ApiError, DatasetError, PerformanceMetric, RenderError};

/// Tracking facade over a [`MetricsStore`].
#[derive(Debug, Clone)]
pub struct ErrorTracker {
    store: MetricsStore,
}

impl ErrorTracker {
    pub fn new(store: MetricsStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    /// Record a failure caught while `component` was rendering.
    pub fn track_render_error(&self, component: &str, err: &(dyn std::error::Error + 'static)) {
        self.track_render_failure(component, err.to_string(), source_chain(err));
    }

    /// Same as [`Self::track_render_error`] for failures that arrive as text
    /// (panic payloads, reports from a browser).
    pub fn track_render_failure(&self, component: &str, message: String, stack: Option<String>) {
        error!(component = %component, error = %message, "Render error");
        self.store.record_render_error(RenderError {
            component: component.to_string(),
            message,
            stack,
            timestamp: Utc::now(),
        });
    }

    /// Record a failed call to `endpoint`.
    pub fn track_api_error(
        &self,
        endpoint: &str,
        err: &(dyn std::error::Error + 'static),
        status: Option<u16>,
    ) {
        self.track_api_failure(endpoint, err.to_string(), status);
    }

    pub fn track_api_failure(&self, endpoint: &str, message: String, status: Option<u16>) {
        error!(endpoint = %endpoint, status = ?status, error = %message, "API error");
        self.store.record_api_error(ApiError {
            endpoint: endpoint.to_string(),
            message,
            status,
            timestamp: Utc::now(),
        });
    }

    pub fn track_performance(&self, metric: PerformanceMetric, value: f64) {
        self.store.set_performance(metric, value);
    }

    pub fn track_api_response_time(&self, endpoint: &str, time_ms: f64) {
        self.store.set_api_response_time(endpoint, time_ms);
    }

    pub fn update_data_state(&self, name: &str, rows: Vec<Value>) -> Result<(), DatasetError> {
        self.store.replace_dataset(name, rows)
    }

    pub fn update_component_state(&self, component: &str, state: Value) {
        self.store.replace_component_state(component, state);
    }

    pub fn clear_errors(&self) {
        self.store.clear_errors();
    }

    /// Run `call`, recording its response time on success or an [`ApiError`]
    /// on failure. The original result is handed back either way.
    pub async fn instrument<T, E, F>(&self, endpoint: &str, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        self.instrument_with_status(endpoint, call, |_| None).await
    }

    /// [`Self::instrument`] with a hook that extracts an HTTP status from the error.
    pub async fn instrument_with_status<T, E, F, S>(
        &self,
        endpoint: &str,
        call: F,
        status_of: S,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
        S: FnOnce(&E) -> Option<u16>,
    {
        let started = Instant::now();
        match call.await {
            Ok(value) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.track_api_response_time(endpoint, elapsed_ms);
                Ok(value)
            }
            Err(e) => {
                self.track_api_error(endpoint, &e, status_of(&e));
                Err(e)
            }
        }
    }
}

/// Status of a failed `reqwest` call, for [`ErrorTracker::instrument_with_status`].
pub fn reqwest_status(err: &reqwest::Error) -> Option<u16> {
    err.status().map(|s| s.as_u16())
}

/// Render the `source()` chain below `err`, one cause per line.
fn source_chain(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        causes.push(format!("caused by: {cause}"));
        current = cause.source();
    }
    (!causes.is_empty()).then(|| causes.join("\n"))
}
