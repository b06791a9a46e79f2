//! Core data types for dashboard health tracking
//!
//! Everything here serializes with camelCase field names so the snapshot sent
//! to the analysis service matches what the dashboard front end produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

// ============================================================================
// Tracked Errors
// ============================================================================

/// An uncaught failure raised while a UI component was rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderError {
    /// Component that failed
    pub component: String,
    /// Error message
    pub message: String,
    /// Stack trace or source chain, when one was available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// When the failure was tracked
    pub timestamp: DateTime<Utc>,
}

/// A failed call to a backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Endpoint (or query key) that failed
    pub endpoint: String,
    /// Error message
    pub message: String,
    /// HTTP status, if the failure carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// When the failure was tracked
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Bounded Error Log
// ============================================================================

/// FIFO list that drops its oldest entry once `capacity` is exceeded.
///
/// Serializes as a plain JSON array. Deserializing keeps only the most
/// recent entries that fit the default capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    #[serde(skip)]
    capacity: usize,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for BoundedLog<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<T>::deserialize(deserializer)?;
        let mut log = Self::default();
        for entry in entries {
            log.push(entry);
        }
        Ok(log)
    }
}

fn default_log_capacity() -> usize {
    crate::config::defaults::ERROR_LOG_CAPACITY
}

impl<T> BoundedLog<T> {
    /// Create an empty log. A zero capacity is clamped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append an entry, returning the evicted entry if the log was full.
    pub fn push(&mut self, entry: T) -> Option<T> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }
}

impl<T> Default for BoundedLog<T> {
    fn default() -> Self {
        Self::with_capacity(default_log_capacity())
    }
}

// ============================================================================
// Performance Metrics
// ============================================================================

/// Performance numbers reported by the dashboard. Overwritten in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Time from navigation start to ready (ms)
    pub load_time: f64,
    /// Memory in use as a percentage of the available total
    pub memory_usage: f64,
    /// Last measured render time (ms)
    pub render_time: f64,
    /// Last response time per endpoint (ms)
    pub api_response_times: BTreeMap<String, f64>,
}

/// Scalar fields of [`PerformanceMetrics`] that can be set by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PerformanceMetric {
    LoadTime,
    MemoryUsage,
    RenderTime,
}

impl PerformanceMetric {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadTime => "loadTime",
            Self::MemoryUsage => "memoryUsage",
            Self::RenderTime => "renderTime",
        }
    }
}

impl std::fmt::Display for PerformanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected performance metric name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    #[error("'apiResponseTimes' is a per-endpoint map, not a scalar metric")]
    NotScalar,
    #[error("unknown performance metric '{0}'")]
    Unknown(String),
}

impl std::str::FromStr for PerformanceMetric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loadTime" | "load_time" => Ok(Self::LoadTime),
            "memoryUsage" | "memory_usage" => Ok(Self::MemoryUsage),
            "renderTime" | "render_time" => Ok(Self::RenderTime),
            "apiResponseTimes" | "api_response_times" => Err(MetricError::NotScalar),
            other => Err(MetricError::Unknown(other.to_string())),
        }
    }
}

// ============================================================================
// Dashboard State
// ============================================================================

/// Aggregate health record for one dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub render_errors: BoundedLog<RenderError>,
    pub api_errors: BoundedLog<ApiError>,
    pub performance_metrics: PerformanceMetrics,
    /// Per-component UI state, free-form
    pub component_state: BTreeMap<String, Value>,
    /// Named datasets (`salesData`, `customersData`, ...), flattened into the
    /// top level of the serialized form
    #[serde(flatten)]
    pub datasets: BTreeMap<String, Vec<Value>>,
}

impl DashboardState {
    /// Empty state with both error logs bounded to `error_capacity`.
    pub fn new(error_capacity: usize) -> Self {
        Self {
            render_errors: BoundedLog::with_capacity(error_capacity),
            api_errors: BoundedLog::with_capacity(error_capacity),
            performance_metrics: PerformanceMetrics::default(),
            component_state: BTreeMap::new(),
            datasets: BTreeMap::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.render_errors.len() + self.api_errors.len()
    }
}

/// Top-level snapshot fields that a dataset name would shadow once datasets
/// are flattened into the serialized state.
pub const RESERVED_DATASET_NAMES: [&str; 4] =
    ["renderErrors", "apiErrors", "performanceMetrics", "componentState"];

/// Rejected dataset name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset name must not be empty")]
    EmptyName,
    #[error("'{0}' is a reserved state field")]
    Reserved(String),
}

/// Check that `name` can be stored as a dataset.
pub fn validate_dataset_name(name: &str) -> Result<(), DatasetError> {
    if name.trim().is_empty() {
        Err(DatasetError::EmptyName)
    } else if RESERVED_DATASET_NAMES.contains(&name) {
        Err(DatasetError::Reserved(name.to_string()))
    } else {
        Ok(())
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(default_log_capacity())
    }
}
