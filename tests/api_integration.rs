//! HTTP API Integration Tests
//!
//! Exercises the complete router (`create_app`) with `tower::ServiceExt::oneshot`,
//! backed by an in-process analysis service.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use dashboard_intelligence::api::create_app;
use dashboard_intelligence::{
    AnalysisError, AnalysisResponse, AnalysisService, DashboardIntelligence, DashboardState,
    HealingEvent, IntelConfig,
};

/// Recommends reloading every component that currently has a render error.
struct ReloadFailedComponents;

#[async_trait]
impl AnalysisService for ReloadFailedComponents {
    async fn analyze(&self, state: &DashboardState) -> Result<AnalysisResponse, AnalysisError> {
        let recommendations = state
            .render_errors
            .iter()
            .map(|e| json!({"action": "reload_component", "target": e.component}))
            .collect();
        Ok(AnalysisResponse {
            recommendations,
            insights: Some(json!({"summary": "render failures detected"})),
        })
    }
}

fn setup() -> (DashboardIntelligence, Router) {
    let intel =
        DashboardIntelligence::with_service(IntelConfig::default(), Arc::new(ReloadFailedComponents));
    let app = create_app(intel.clone());
    (intel, app)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn tracked_errors_appear_in_state_until_cleared() {
    let (_intel, app) = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/errors/api",
        Some(json!({"endpoint": "/sales", "message": "Internal Server Error", "status": 500})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, state) = send(&app, "GET", "/api/v1/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["data"]["apiErrors"][0]["endpoint"], "/sales");
    assert_eq!(state["data"]["apiErrors"][0]["status"], 500);

    let (status, cleared) = send(&app, "DELETE", "/api/v1/errors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["data"]["apiErrors"], 0);

    let (_, state) = send(&app, "GET", "/api/v1/state", None).await;
    assert!(state["data"]["apiErrors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn datasets_and_component_state_are_replaced_wholesale() {
    let (_intel, app) = setup();

    send(&app, "PUT", "/api/v1/datasets/salesData", Some(json!([{"month": "Jan"}, {"month": "Feb"}]))).await;
    send(&app, "PUT", "/api/v1/datasets/salesData", Some(json!([{"month": "Mar"}]))).await;
    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/components/SalesChart/state",
        Some(json!({"zoom": 2, "series": ["total"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, state) = send(&app, "GET", "/api/v1/state", None).await;
    assert_eq!(state["data"]["salesData"], json!([{"month": "Mar"}]));
    assert_eq!(state["data"]["componentState"]["SalesChart"]["zoom"], 2);
}

#[tokio::test]
async fn performance_metrics_round_trip_through_state() {
    let (_intel, app) = setup();

    let (status, metrics) = send(
        &app,
        "PUT",
        "/api/v1/metrics/performance",
        Some(json!({"metric": "renderTime", "value": 16.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["data"]["renderTime"], 16.5);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/metrics/performance",
        Some(json!({"metric": "frameRate", "value": 60.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("frameRate"));
}

#[tokio::test]
async fn analysis_endpoint_dispatches_reload_events() {
    let (intel, app) = setup();
    let mut events = intel.bus().subscribe();

    send(
        &app,
        "POST",
        "/api/v1/errors/render",
        Some(json!({"component": "RevenueTable", "message": "Cannot read properties of undefined"})),
    )
    .await;

    let (status, body) = send(&app, "POST", "/api/v1/analysis", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recommendations"][0]["target"], "RevenueTable");
    assert_eq!(body["data"]["insights"]["summary"], "render failures detected");

    assert_eq!(
        events.try_next(),
        Some(HealingEvent::Reload {
            target: "RevenueTable".to_string()
        })
    );
}

#[tokio::test]
async fn health_reports_counts() {
    let (_intel, app) = setup();
    send(
        &app,
        "POST",
        "/api/v1/errors/render",
        Some(json!({"component": "KpiGrid", "message": "boom"})),
    )
    .await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["errorCount"], 1);
    assert_eq!(body["data"]["analysis"]["requests"], 0);
}

#[tokio::test]
async fn malformed_json_is_rejected_by_extractor() {
    let (_intel, app) = setup();
    let req = Request::post("/api/v1/errors/render")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
