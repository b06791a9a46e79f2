//! Dashboard intelligence configuration (TOML + environment overrides)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

/// Env var naming the config file to load.
pub const CONFIG_PATH_ENV: &str = "DASHBOARD_INTEL_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "dashboard_intel.toml";

/// Top-level configuration.
///
/// Loading order:
/// 1. `$DASHBOARD_INTEL_CONFIG` env var
/// 2. `./dashboard_intel.toml`
/// 3. Built-in defaults
///
/// Individual values can then be overridden with [`IntelConfig::apply_env_overrides`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelConfig {
    /// Remote analysis service
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Metrics store bounds
    #[serde(default)]
    pub store: StoreConfig,

    /// Healing event channel
    #[serde(default)]
    pub events: EventsConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Full URL of the analysis function
    pub url: String,
    /// Optional key for the hosted function gateway
    pub api_key: String,
    pub timeout_secs: u64,
    /// Proactive health check period
    pub health_check_interval_secs: u64,
    /// Minimum spacing between requests; triggers inside it are coalesced
    pub min_request_gap_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            url: defaults::ANALYSIS_URL.to_string(),
            api_key: String::new(),
            timeout_secs: defaults::ANALYSIS_TIMEOUT_SECS,
            health_check_interval_secs: defaults::HEALTH_CHECK_INTERVAL_SECS,
            min_request_gap_ms: defaults::MIN_REQUEST_GAP_MS,
        }
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn min_request_gap(&self) -> Duration {
        Duration::from_millis(self.min_request_gap_ms)
    }

    /// The API key, or `None` when unset.
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub error_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            error_capacity: defaults::ERROR_LOG_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Allowed cross-origin dashboard hosts; empty means same-origin only
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
            cors_origins: Vec::new(),
        }
    }
}

impl IntelConfig {
    /// Load configuration using the standard search order.
    ///
    /// Never fails: a broken file is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {CONFIG_PATH_ENV}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_PATH_ENV}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_PATH_ENV} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Apply `DASHBOARD_INTEL_*` environment overrides on top of the loaded file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override hook with an injectable lookup, so tests need not touch the
    /// process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DASHBOARD_INTEL_ANALYSIS_URL") {
            info!(url = %url, "Analysis URL overridden from environment");
            self.analysis.url = url;
        }
        if let Some(key) = lookup("DASHBOARD_INTEL_API_KEY") {
            self.analysis.api_key = key;
        }
        if let Some(addr) = lookup("DASHBOARD_INTEL_SERVER_ADDR") {
            self.server.addr = addr;
        }
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Analysis URL must be http(s)
    /// - Timeouts, intervals and capacities must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let url = self.analysis.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("analysis.url: must start with http:// or https:// (got '{url}')"));
        }
        Self::check_positive(self.analysis.timeout_secs, "analysis.timeout_secs", &mut errors);
        Self::check_positive(
            self.analysis.health_check_interval_secs,
            "analysis.health_check_interval_secs",
            &mut errors,
        );
        Self::check_positive(self.store.error_capacity as u64, "store.error_capacity", &mut errors);
        Self::check_positive(self.events.channel_capacity as u64, "events.channel_capacity", &mut errors);
        if self.server.addr.trim().is_empty() {
            errors.push("server.addr: must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: u64, name: &str, errors: &mut Vec<String>) {
        if value == 0 {
            errors.push(format!("{name}: must be greater than zero"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}
