//! Typed recovery events broadcast to UI wrappers

use serde::{Deserialize, Serialize};

/// Recovery event carried on the [`HealingBus`](super::HealingBus).
///
/// Serialized for browser consumers as
/// `{"type": "dashboard:reload-component", "detail": {"component": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum HealingEvent {
    /// Re-render the named component from scratch
    #[serde(rename = "dashboard:reload-component")]
    Reload {
        #[serde(rename = "component")]
        target: String,
    },
    /// Invalidate and re-issue the request for the named endpoint
    #[serde(rename = "dashboard:retry-request")]
    Retry {
        endpoint: String,
        #[serde(rename = "maxRetries", default, skip_serializing_if = "Option::is_none")]
        max_retries: Option<u32>,
    },
    /// Swap the named component to cached/default data
    #[serde(rename = "dashboard:load-fallback")]
    LoadFallback {
        #[serde(rename = "component")]
        target: String,
    },
}

impl HealingEvent {
    /// Component or endpoint the event is aimed at.
    pub fn target(&self) -> &str {
        match self {
            Self::Reload { target } | Self::LoadFallback { target } => target,
            Self::Retry { endpoint, .. } => endpoint,
        }
    }

    /// Wire name of the event.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Reload { .. } => "dashboard:reload-component",
            Self::Retry { .. } => "dashboard:retry-request",
            Self::LoadFallback { .. } => "dashboard:load-fallback",
        }
    }
}

impl std::fmt::Display for HealingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retry {
                endpoint,
                max_retries: Some(n),
            } => write!(f, "{} -> {endpoint} (max {n})", self.name()),
            _ => write!(f, "{} -> {}", self.name(), self.target()),
        }
    }
}
