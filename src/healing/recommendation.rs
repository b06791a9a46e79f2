//! Recovery recommendations returned by the analysis service
//!
//! The service answers with loosely shaped JSON. Each entry is validated into
//! the closed [`Recommendation`] set here, at the boundary; anything else is
//! rejected with a [`RecommendationError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::HealingEvent;

/// A validated recovery action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Recommendation {
    ReloadComponent {
        target: String,
    },
    RetryRequest {
        target: String,
        #[serde(rename = "maxRetries", skip_serializing_if = "Option::is_none")]
        max_retries: Option<u32>,
    },
    LoadFallbackData {
        target: String,
    },
}

impl Recommendation {
    pub fn target(&self) -> &str {
        match self {
            Self::ReloadComponent { target }
            | Self::RetryRequest { target, .. }
            | Self::LoadFallbackData { target } => target,
        }
    }
}

impl From<Recommendation> for HealingEvent {
    fn from(rec: Recommendation) -> Self {
        match rec {
            Recommendation::ReloadComponent { target } => Self::Reload { target },
            Recommendation::RetryRequest {
                target,
                max_retries,
            } => Self::Retry {
                endpoint: target,
                max_retries,
            },
            Recommendation::LoadFallbackData { target } => Self::LoadFallback { target },
        }
    }
}

/// Why a raw recommendation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendationError {
    #[error("unknown recommendation action '{0}'")]
    UnknownAction(String),
    #[error("recommendation '{0}' has no target")]
    MissingTarget(String),
    #[error("malformed recommendation: {0}")]
    Malformed(String),
}

/// Wire form, before validation.
#[derive(Debug, Deserialize)]
struct RawRecommendation {
    action: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default, alias = "maxRetries")]
    max_retries: Option<u32>,
}

impl TryFrom<RawRecommendation> for Recommendation {
    type Error = RecommendationError;

    fn try_from(raw: RawRecommendation) -> Result<Self, Self::Error> {
        let action = raw.action.trim().replace('-', "_");
        if !matches!(
            action.as_str(),
            "reload_component" | "retry_request" | "load_fallback_data"
        ) {
            return Err(RecommendationError::UnknownAction(raw.action));
        }

        let target = match raw.target.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(RecommendationError::MissingTarget(action)),
        };

        Ok(match action.as_str() {
            "reload_component" => Self::ReloadComponent { target },
            "retry_request" => Self::RetryRequest {
                target,
                max_retries: raw.max_retries,
            },
            _ => Self::LoadFallbackData { target },
        })
    }
}

impl TryFrom<&Value> for Recommendation {
    type Error = RecommendationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let raw: RawRecommendation = serde_json::from_value(value.clone())
            .map_err(|e| RecommendationError::Malformed(e.to_string()))?;
        raw.try_into()
    }
}

/// Validate every entry, keeping the good ones in order and collecting the
/// rejections.
pub fn parse_recommendations(raw: &[Value]) -> (Vec<Recommendation>, Vec<RecommendationError>) {
    let mut accepted = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    for value in raw {
        match Recommendation::try_from(value) {
            Ok(rec) => accepted.push(rec),
            Err(e) => rejected.push(e),
        }
    }
    (accepted, rejected)
}
