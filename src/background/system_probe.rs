//! Startup probes: load time and memory usage
//!
//! Seeds the performance metrics once the service is ready, the same numbers
//! the dashboard front end reports for itself on load.

use std::time::Instant;
use tracing::{debug, info};

use crate::tracker::ErrorTracker;
use crate::types::PerformanceMetric;

/// System memory in use, as a percentage of total RAM.
///
/// Buffers count as free. Returns `None` where the probe is unsupported.
#[cfg(target_os = "linux")]
pub fn memory_usage_percent() -> Option<f64> {
    use std::mem::MaybeUninit;

    let mut info = MaybeUninit::<libc::sysinfo>::uninit();
    let result = unsafe { libc::sysinfo(info.as_mut_ptr()) };
    if result != 0 {
        debug!("sysinfo(2) failed, memory usage unavailable");
        return None;
    }
    let info = unsafe { info.assume_init() };

    let unit = f64::from(info.mem_unit.max(1));
    let total = info.totalram as f64 * unit;
    if total <= 0.0 {
        return None;
    }
    let free = (info.freeram as f64 + info.bufferram as f64) * unit;
    Some(((total - free) / total * 100.0).clamp(0.0, 100.0))
}

#[cfg(not(target_os = "linux"))]
pub fn memory_usage_percent() -> Option<f64> {
    None
}

/// Record `loadTime` (ms since `started`) and, when available, `memoryUsage`.
pub fn record_startup_metrics(tracker: &ErrorTracker, started: Instant) {
    let load_ms = started.elapsed().as_secs_f64() * 1000.0;
    tracker.track_performance(PerformanceMetric::LoadTime, load_ms);

    match memory_usage_percent() {
        Some(pct) => {
            tracker.track_performance(PerformanceMetric::MemoryUsage, pct);
            info!(load_ms = load_ms as u64, memory_pct = format!("{pct:.1}"), "Startup metrics recorded");
        }
        None => info!(load_ms = load_ms as u64, "Startup metrics recorded (memory usage unavailable)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetricsStore;

    #[test]
    fn memory_usage_is_a_percentage() {
        if let Some(pct) = memory_usage_percent() {
            assert!((0.0..=100.0).contains(&pct));
        }
    }

    #[test]
    fn startup_metrics_set_load_time() {
        let tracker = ErrorTracker::new(MetricsStore::new(10));
        let started = Instant::now();
        record_startup_metrics(&tracker, started);
        let metrics = tracker.store().snapshot().performance_metrics;
        assert!(metrics.load_time >= 0.0);
        assert!(!metrics.memory_usage.is_nan());
    }
}
