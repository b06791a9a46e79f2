//! Background services: proactive analysis loop and system probes
//!
//! The analysis loop runs as a tokio task that asks for dashboard
//! intelligence every health-check interval and whenever error tracking
//! fires the trigger.

pub mod analysis_loop;
pub mod system_probe;

pub use analysis_loop::{AnalysisLoop, WakeReason};
pub use system_probe::{memory_usage_percent, record_startup_metrics};
