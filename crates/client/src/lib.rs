//! Analysis service client.
//!
//! Provides the `AnalysisBackend` trait and its HTTP implementation. The
//! lifecycle only sees the trait, so tests and alternative transports can
//! stand in for the real service.

use patentguard_model::{AnalysisResult, AnalyzeRequest, HealthStatus};
use patentguard_validate::InventionDescription;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Shown when the service gives no usable detail of its own.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to analyze invention. Please ensure the backend is running and try again.";

/// Errors from analysis service calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network unreachable, connection reset, transport timeout
    #[error("Connection failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail provided"))]
    Status { status: u16, detail: Option<String> },

    /// A success response whose body is not an `AnalysisResult`
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::MalformedResponse(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl ClientError {
    /// The single message a user sees for this failure.
    ///
    /// Service-supplied detail wins; everything else collapses to
    /// [`GENERIC_FAILURE_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Pull a human-readable `detail` out of an error body.
///
/// Accepts `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}, ...]}`. Blank or missing detail yields `None`.
pub fn extract_detail(body: &str) -> Option<String> {
    let envelope: Value = serde_json::from_str(body).ok()?;

    match envelope.get("detail")? {
        Value::String(detail) => {
            let detail = detail.trim();
            (!detail.is_empty()).then(|| detail.to_string())
        }
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str).or_else(|| e.as_str()))
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

/// Trait for analysis backends.
pub trait AnalysisBackend {
    /// Submit one description. Performs exactly one call; never retries.
    fn analyze(
        &self,
        description: &InventionDescription,
    ) -> impl Future<Output = Result<AnalysisResult, ClientError>> + Send;

    /// Diagnostic reachability check.
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, ClientError>> + Send;

    /// Get the backend name for logging.
    fn name(&self) -> &'static str;
}

/// Analysis service client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, including the `/api` prefix
    pub base_url: String,
    /// Transport timeout in seconds; `None` keeps the transport default
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: None,
        }
    }
}

/// HTTP client for the PatentGuard analysis API.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpAnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into `ClientError::Status`.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body);
        tracing::warn!(status = status.as_u16(), detail = ?detail, "Analysis service returned an error");

        Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

impl AnalysisBackend for HttpAnalysisClient {
    async fn analyze(
        &self,
        description: &InventionDescription,
    ) -> Result<AnalysisResult, ClientError> {
        let url = self.endpoint("analyze");
        let request = AnalyzeRequest::new(description.as_str());

        tracing::debug!(url = %url, chars = request.invention_idea.chars().count(), "Submitting invention for analysis");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        let response = Self::check_status(response).await?;

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    async fn health_check(&self) -> Result<HealthStatus, ClientError> {
        let response = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body = response.text().await.unwrap_or_default();

        Ok(serde_json::from_str(&body).unwrap_or_else(|_| HealthStatus::reachable()))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
