//! REST API module using Axum
//!
//! Exposes the tracker and the healing event stream to dashboards that are
//! not written in Rust:
//! - /api/v1 tracking, state and analysis endpoints with a consistent envelope
//! - /api/v1/events Server-Sent Events stream of healing events
//! - /health at root level

pub mod envelope;
mod events;
pub mod handlers;
mod routes;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults::MAX_REQUEST_BODY_BYTES;
use crate::service::DashboardIntelligence;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// `server.cors_origins` lists origins allowed to call the API, e.g.
/// `http://localhost:5173` for a Vite dev server.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return base;
    }

    let allowed: Vec<_> = origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    tracing::info!(origins = ?origins, "CORS: allowing configured origins");
    base.allow_origin(allowed)
}

/// Create the complete application router.
pub fn create_app(intel: DashboardIntelligence) -> Router {
    let cors = build_cors_layer(&intel.config().server.cors_origins);

    Router::new()
        .nest("/api/v1", routes::api_routes(intel.clone()))
        .merge(routes::health_routes(intel))
        // Middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
