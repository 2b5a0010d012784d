use crate::domain::model::{GenerationJob, GenerationRequest, JobStatusResponse, Report};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SUBMIT_FAILURE: &str = "Failed to start report generation";

/// Submission failure, decoded once at the service boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// HTTP 429: the organization used up its report allowance.
    #[error("{message}")]
    QuotaExceeded { used: u64, limit: u64, message: String },

    #[error("{message}")]
    Failed { message: String },
}

impl SubmitError {
    pub fn failed(message: Option<String>) -> Self {
        SubmitError::Failed {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBMIT_FAILURE.to_string()),
        }
    }
}

#[async_trait]
pub trait ReportService: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> std::result::Result<GenerationJob, SubmitError>;
    async fn status(&self, report_id: &str) -> Result<JobStatusResponse>;
    async fn fetch_report(&self, report_id: &str) -> Result<Report>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn api_token(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
    fn poll_interval(&self) -> Duration;
    fn max_consecutive_poll_errors(&self) -> Option<u32>;
}
