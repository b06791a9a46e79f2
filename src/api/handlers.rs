//! API handlers
//!
//! Thin adapters from HTTP to the tracker, store and requester. Every handler
//! answers with the envelope from [`super::envelope`].

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::healing::BusStats;
use crate::intelligence::RequesterStats;
use crate::service::DashboardIntelligence;
use crate::types::PerformanceMetric;

// ============================================================================
// Request / response types
// ============================================================================

/// Render failure reported by the front end's error boundary.
#[derive(Debug, Deserialize)]
pub struct RenderErrorReport {
    pub component: String,
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
}

/// Failed backend call reported by the front end's data layer.
#[derive(Debug, Deserialize)]
pub struct ApiErrorReport {
    pub endpoint: String,
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PerformanceUpdate {
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeUpdate {
    pub time_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedResponse {
    pub render_errors: usize,
    pub api_errors: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub error_count: usize,
    pub error_capacity: usize,
    pub analysis: RequesterStats,
    pub events: BusStats,
}

fn tracked(intel: &DashboardIntelligence) -> TrackedResponse {
    let snapshot = intel.store().snapshot();
    TrackedResponse {
        render_errors: snapshot.render_errors.len(),
        api_errors: snapshot.api_errors.len(),
    }
}

fn require_name(value: &str, field: &str) -> Result<(), Response> {
    if value.trim().is_empty() {
        Err(ApiErrorResponse::bad_request(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn require_finite(value: f64, field: &str) -> Result<(), Response> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ApiErrorResponse::unprocessable(format!("{field} must be a finite number")))
    }
}

// ============================================================================
// Error tracking
// ============================================================================

/// POST /api/v1/errors/render
pub async fn track_render_error(
    State(intel): State<DashboardIntelligence>,
    Json(report): Json<RenderErrorReport>,
) -> Response {
    if let Err(resp) = require_name(&report.component, "component") {
        return resp;
    }
    intel
        .tracker()
        .track_render_failure(report.component.trim(), report.message, report.stack);
    ApiResponse::accepted(tracked(&intel))
}

/// POST /api/v1/errors/api
pub async fn track_api_error(
    State(intel): State<DashboardIntelligence>,
    Json(report): Json<ApiErrorReport>,
) -> Response {
    if let Err(resp) = require_name(&report.endpoint, "endpoint") {
        return resp;
    }
    intel
        .tracker()
        .track_api_failure(report.endpoint.trim(), report.message, report.status);
    ApiResponse::accepted(tracked(&intel))
}

/// DELETE /api/v1/errors
pub async fn clear_errors(State(intel): State<DashboardIntelligence>) -> Response {
    intel.tracker().clear_errors();
    ApiResponse::ok(tracked(&intel))
}

// ============================================================================
// Metrics and state
// ============================================================================

/// PUT /api/v1/metrics/performance
pub async fn set_performance(
    State(intel): State<DashboardIntelligence>,
    Json(update): Json<PerformanceUpdate>,
) -> Response {
    let metric = match update.metric.parse::<PerformanceMetric>() {
        Ok(m) => m,
        Err(e) => return ApiErrorResponse::bad_request(e.to_string()),
    };
    if let Err(resp) = require_finite(update.value, "value") {
        return resp;
    }
    intel.tracker().track_performance(metric, update.value);
    ApiResponse::ok(intel.store().snapshot().performance_metrics)
}

/// PUT /api/v1/metrics/response-times/*endpoint
pub async fn set_response_time(
    State(intel): State<DashboardIntelligence>,
    Path(endpoint): Path<String>,
    Json(update): Json<ResponseTimeUpdate>,
) -> Response {
    if let Err(resp) = require_name(&endpoint, "endpoint") {
        return resp;
    }
    if let Err(resp) = require_finite(update.time_ms, "timeMs") {
        return resp;
    }
    intel.tracker().track_api_response_time(&endpoint, update.time_ms);
    ApiResponse::ok(intel.store().snapshot().performance_metrics)
}

/// PUT /api/v1/datasets/:name
pub async fn replace_dataset(
    State(intel): State<DashboardIntelligence>,
    Path(name): Path<String>,
    Json(rows): Json<Vec<Value>>,
) -> Response {
    let count = rows.len();
    if let Err(e) = intel.tracker().update_data_state(&name, rows) {
        return ApiErrorResponse::bad_request(e.to_string());
    }
    ApiResponse::ok(serde_json::json!({ "dataset": name, "rows": count }))
}

/// PUT /api/v1/components/:name/state
pub async fn replace_component_state(
    State(intel): State<DashboardIntelligence>,
    Path(name): Path<String>,
    Json(state): Json<Value>,
) -> Response {
    intel.tracker().update_component_state(&name, state);
    ApiResponse::ok(serde_json::json!({ "component": name }))
}

/// GET /api/v1/state
pub async fn get_state(State(intel): State<DashboardIntelligence>) -> Response {
    ApiResponse::ok(intel.store().snapshot())
}

// ============================================================================
// Analysis
// ============================================================================

/// POST /api/v1/analysis
///
/// Runs one analysis now. `data` is `null` when the service could not be
/// reached; that is not an HTTP error.
pub async fn run_analysis(State(intel): State<DashboardIntelligence>) -> Response {
    ApiResponse::ok(intel.requester().request_intelligence_analysis().await)
}

/// GET /health
pub async fn health_check(State(intel): State<DashboardIntelligence>) -> Response {
    let analysis = intel.requester().stats();
    let status = if analysis.failures > 0 && analysis.last_success.is_none() {
        "degraded"
    } else {
        "ok"
    };
    ApiResponse::ok(HealthResponse {
        status,
        error_count: intel.store().error_count(),
        error_capacity: intel.store().error_capacity(),
        analysis,
        events: intel.bus().stats(),
    })
}
