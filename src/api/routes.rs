//! API route definitions
//!
//! - /api/v1/errors/* - render/API error tracking
//! - /api/v1/metrics/* - performance metrics
//! - /api/v1/datasets, /api/v1/components - dashboard data and UI state
//! - /api/v1/state - full snapshot
//! - /api/v1/analysis - on-demand analysis
//! - /api/v1/events - healing event stream (SSE)

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::{events, handlers};
use crate::service::DashboardIntelligence;

/// Create all API routes
pub fn api_routes(state: DashboardIntelligence) -> Router {
    Router::new()
        .route("/errors/render", post(handlers::track_render_error))
        .route("/errors/api", post(handlers::track_api_error))
        .route("/errors", delete(handlers::clear_errors))
        .route("/metrics/performance", put(handlers::set_performance))
        .route("/metrics/response-times/*endpoint", put(handlers::set_response_time))
        .route("/datasets/:name", put(handlers::replace_dataset))
        .route("/components/:name/state", put(handlers::replace_component_state))
        .route("/state", get(handlers::get_state))
        .route("/analysis", post(handlers::run_analysis))
        .route("/events", get(events::event_stream))
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes(state: DashboardIntelligence) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntelConfig;
    use crate::intelligence::{AnalysisError, AnalysisResponse, AnalysisService};
    use crate::types::DashboardState;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Offline;

    #[async_trait]
    impl AnalysisService for Offline {
        async fn analyze(&self, _: &DashboardState) -> Result<AnalysisResponse, AnalysisError> {
            Err(AnalysisError::Unavailable("offline".to_string()))
        }
    }

    fn create_test_state() -> DashboardIntelligence {
        DashboardIntelligence::with_service(IntelConfig::default(), Arc::new(Offline))
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn render_error_is_tracked() {
        let state = create_test_state();
        let app = api_routes(state.clone());

        let resp = app
            .oneshot(json_request(
                "POST",
                "/errors/render",
                serde_json::json!({"component": "SalesChart", "message": "undefined is not a function"}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(resp).await["data"]["renderErrors"], 1);
        assert_eq!(state.store().snapshot().render_errors.last().unwrap().component, "SalesChart");
    }

    #[tokio::test]
    async fn blank_endpoint_is_rejected() {
        let app = api_routes(create_test_state());
        let resp = app
            .oneshot(json_request(
                "POST",
                "/errors/api",
                serde_json::json!({"endpoint": "  ", "message": "x"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_scalar_metric_is_rejected() {
        let app = api_routes(create_test_state());
        let resp = app
            .oneshot(json_request(
                "PUT",
                "/metrics/performance",
                serde_json::json!({"metric": "apiResponseTimes", "value": 3.0}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn response_time_accepts_nested_endpoint_path() {
        let state = create_test_state();
        let app = api_routes(state.clone());
        let resp = app
            .oneshot(json_request(
                "PUT",
                "/metrics/response-times/rest/v1/sales",
                serde_json::json!({"timeMs": 120.5}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let times = state.store().snapshot().performance_metrics.api_response_times;
        assert_eq!(times.get("rest/v1/sales"), Some(&120.5));
    }

    #[tokio::test]
    async fn dataset_cannot_shadow_state_fields() {
        let app = api_routes(create_test_state());
        let resp = app
            .oneshot(json_request("PUT", "/datasets/renderErrors", serde_json::json!([])))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analysis_failure_returns_null_data() {
        let app = api_routes(create_test_state());
        let resp = app
            .oneshot(Request::post("/analysis").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_json(resp).await["data"].is_null());
    }

    #[tokio::test]
    async fn health_reports_degraded_when_analysis_never_succeeded() {
        let state = create_test_state();
        state.requester().request_intelligence_analysis().await;

        let app = health_routes(state);
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["data"]["status"], "degraded");
        assert_eq!(v["data"]["analysis"]["failures"], 1);
        assert_eq!(v["data"]["errorCapacity"], 10);
    }
}
