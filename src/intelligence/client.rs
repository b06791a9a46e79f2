//! Analysis service client
//!
//! POSTs `{ "data": <DashboardState> }` to the hosted analysis function and
//! decodes `{ "recommendations"?: [...] }`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AnalysisConfig;
use crate::types::DashboardState;

/// Analysis request failures. Logged by the requester, never surfaced.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    ServerError(reqwest::StatusCode),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Analysis service unavailable: {0}")]
    Unavailable(String),
}

/// Request body.
#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    pub data: &'a DashboardState,
}

/// Response body. Recommendations stay raw until the dispatcher validates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub recommendations: Vec<Value>,
    /// Free-form insights text or structure, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Value>,
}

/// Something that can analyse a dashboard snapshot.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, snapshot: &DashboardState) -> Result<AnalysisResponse, AnalysisError>;
}

/// HTTP implementation backed by `reqwest`.
#[derive(Clone)]
pub struct HttpAnalysisService {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpAnalysisService {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            url: config.url.trim().to_string(),
            api_key: config.api_key().map(str::to_string),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for HttpAnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAnalysisService")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(&self, snapshot: &DashboardState) -> Result<AnalysisResponse, AnalysisError> {
        let mut req = self
            .http
            .post(&self.url)
            .json(&AnalysisRequest { data: snapshot });
        if let Some(key) = &self.api_key {
            req = req
                .header("Authorization", format!("Bearer {key}"))
                .header("apikey", key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AnalysisError::ServerError(status));
        }

        let body = resp.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(AnalysisResponse::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
