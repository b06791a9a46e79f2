//! Dashboard Intelligence: self-healing for analytics dashboards
//!
//! Observes a dashboard session, asks a remote analysis service what is
//! wrong, and turns its recommendations into recovery events.
//!
//! ## Architecture
//!
//! - **Metrics Store**: bounded error logs, performance metrics and data state
//! - **Error Tracker**: entry points that record failures and measurements
//! - **Intelligence Requester**: snapshots the store and calls the analysis service
//! - **Healing Dispatcher**: validates recommendations and publishes events
//! - **Subscribers**: error boundaries, monitored queries and fallback views
//!   that react to events addressed to them

pub mod api;
pub mod background;
pub mod config;
pub mod healing;
pub mod intelligence;
pub mod service;
pub mod store;
pub mod subscriber;
pub mod tracker;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, IntelConfig};

// Re-export commonly used types
pub use types::{
    ApiError, BoundedLog, DashboardState, DatasetError, PerformanceMetric, PerformanceMetrics,
    RenderError,
};

pub use store::MetricsStore;
pub use tracker::ErrorTracker;

// Re-export analysis components
pub use intelligence::{
    AnalysisError, AnalysisResponse, AnalysisService, AnalysisTrigger, HttpAnalysisService,
    IntelligenceRequester,
};

// Re-export healing components
pub use healing::{HealingBus, HealingDispatcher, HealingEvent, Recommendation};

pub use subscriber::{ErrorBoundary, FallbackView, MonitoredQuery, RecoveryListener};

pub use service::DashboardIntelligence;
