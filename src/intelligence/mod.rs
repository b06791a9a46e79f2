//! Remote dashboard intelligence
//!
//! - **AnalysisService**: the remote analyser (HTTP in production)
//! - **IntelligenceRequester**: snapshot → analyse → dispatch, failing open
//! - **AnalysisTrigger**: coalescing signal fired by error tracking

pub mod client;
pub mod requester;
pub mod trigger;

pub use client::{AnalysisError, AnalysisRequest, AnalysisResponse, AnalysisService, HttpAnalysisService};
pub use requester::{IntelligenceRequester, RequesterStats};
pub use trigger::AnalysisTrigger;
