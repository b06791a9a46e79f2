//! System-wide default constants.
//!
//! Grouped by subsystem. Every value here can be overridden from
//! `dashboard_intel.toml` unless noted otherwise.

// ============================================================================
// Metrics Store
// ============================================================================

/// Maximum entries kept in each error log (render and API, independently).
pub const ERROR_LOG_CAPACITY: usize = 10;

// ============================================================================
// Analysis Service
// ============================================================================

/// Analysis endpoint used when nothing else is configured.
///
/// Matches the local hosted-functions gateway used in development.
pub const ANALYSIS_URL: &str = "http://localhost:54321/functions/v1/dashboard-intelligence";

/// HTTP timeout for a single analysis request (seconds).
pub const ANALYSIS_TIMEOUT_SECS: u64 = 30;

/// Interval between proactive health checks (seconds).
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 60;

/// Minimum gap between two consecutive analysis requests (ms).
///
/// Error bursts inside this window collapse into one follow-up request.
pub const MIN_REQUEST_GAP_MS: u64 = 2_000;

// ============================================================================
// Healing Events
// ============================================================================

/// Buffered healing events per subscriber before the slowest one lags.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Retry budget armed by a retry event that carries no `maxRetries`.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

// ============================================================================
// HTTP Server
// ============================================================================

/// Default bind address for the daemon.
pub const SERVER_ADDR: &str = "0.0.0.0:8090";

/// Largest request body accepted by the daemon (bytes). Datasets can be big.
pub const MAX_REQUEST_BODY_BYTES: usize = 8 * 1024 * 1024;
