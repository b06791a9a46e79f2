//! Configuration Module
//!
//! Service configuration loaded from TOML, with environment and CLI
//! overrides layered on top by the daemon.
//!
//! ## Loading Order
//!
//! 1. `DASHBOARD_INTEL_CONFIG` environment variable (path to TOML file)
//! 2. `dashboard_intel.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! ```ignore
//! let mut config = IntelConfig::load();
//! config.apply_env_overrides();
//! let store = MetricsStore::new(config.store.error_capacity);
//! ```

mod intel_config;
pub mod defaults;
pub mod validation;

pub use intel_config::*;
