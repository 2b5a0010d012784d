use crate::domain::model::{GenerationJob, GenerationRequest, JobStatusResponse, Report};
use crate::domain::ports::{ConfigProvider, ReportService, SubmitError};
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`ReportService`] backed by the ProspectX REST API.
#[derive(Debug, Clone)]
pub struct HttpReportService {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpReportService {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let service = Self::with_timeout(config.api_base_url(), config.request_timeout())?;
        Ok(match config.api_token() {
            Some(token) => service.with_token(token),
            None => service,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/reports/{id}[/tail..]` with the id percent-encoded as one path segment.
    fn report_url(&self, report_id: &str, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid_base_url(&self.base_url, e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| invalid_base_url(&self.base_url, "URL cannot carry a path".to_string()))?;
            segments.pop_if_empty().push("reports").push(report_id).extend(tail);
        }
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let endpoint = url.path().to_string();
        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(&endpoint, response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ReportService for HttpReportService {
    async fn submit(&self, request: &GenerationRequest) -> std::result::Result<GenerationJob, SubmitError> {
        let url = self.url("/reports/generate");
        tracing::debug!("POST {}", url);

        let response = match self
            .authorized(self.client.post(&url).json(&request.to_body()))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("report submission did not reach the service: {}", e);
                return Err(SubmitError::failed(None));
            }
        };

        let status = response.status();
        tracing::debug!("submission response status: {}", status);

        if status.is_success() {
            return response.json::<GenerationJob>().await.map_err(|e| {
                tracing::warn!("unreadable submission response: {}", e);
                SubmitError::failed(None)
            });
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(decode_quota_error(&body))
        } else {
            Err(SubmitError::failed(detail_message(&body)))
        }
    }

    async fn status(&self, report_id: &str) -> Result<JobStatusResponse> {
        self.get_json(self.report_url(report_id, &["status"])?).await
    }

    async fn fetch_report(&self, report_id: &str) -> Result<Report> {
        self.get_json(self.report_url(report_id, &[])?).await
    }
}

fn invalid_base_url(base_url: &str, reason: String) -> ReportError {
    ReportError::InvalidConfigValueError {
        field: "api.base_url".to_string(),
        value: base_url.to_string(),
        reason,
    }
}

async fn ensure_success(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| detail_message(&body))
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    Err(ReportError::HttpStatusError {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// 429 bodies carry `detail` as `{used, limit}` or as a plain string.
pub fn decode_quota_error(body: &Value) -> SubmitError {
    let detail = body.get("detail").unwrap_or(&Value::Null);

    match detail {
        Value::Object(fields) => {
            let used = fields.get("used").map(as_count).unwrap_or(0);
            let limit = fields.get("limit").map(as_count).unwrap_or(0);
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| quota_message(used, limit));
            SubmitError::QuotaExceeded {
                used,
                limit,
                message,
            }
        }
        Value::String(message) => SubmitError::QuotaExceeded {
            used: 0,
            limit: 0,
            message: message.clone(),
        },
        _ => SubmitError::QuotaExceeded {
            used: 0,
            limit: 0,
            message: quota_message(0, 0),
        },
    }
}

fn quota_message(used: u64, limit: u64) -> String {
    if limit == 0 {
        "Report limit reached. Upgrade your plan to generate more reports.".to_string()
    } else {
        format!(
            "You've used {} of {} reports this month. Upgrade your plan to generate more reports.",
            used, limit
        )
    }
}

fn as_count(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
        .unwrap_or(0)
}

/// Pulls a human-readable message out of an error body.
pub fn detail_message(body: &Value) -> Option<String> {
    let message = match body.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Object(detail)) => detail.get("message").and_then(Value::as_str).map(str::to_string),
        // Validation errors arrive as a list of {loc, msg}.
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };

    message
        .or_else(|| body.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}
