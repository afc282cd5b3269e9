//! Provider transport: one HTTP round trip per attempt.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use super::retry::RateLimitHint;
use super::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

/// Provider status string for quota exhaustion.
pub const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// `@type` of the detail message carrying a suggested retry delay.
pub const RETRY_INFO_TYPE: &str = "type.googleapis.com/google.rpc.RetryInfo";

static RETRY_DELAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)(?:\.\d*)?\s*s?\s*$").expect("valid retry delay regex"));

/// Typed transport failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Provider rate limit reached (RESOURCE_EXHAUSTED)")]
    RateLimited { retry_after_seconds: Option<u64> },
    #[error("Provider request failed: {detail}")]
    Other { detail: String },
}

impl TransportError {
    pub fn other(detail: impl Into<String>) -> Self {
        Self::Other {
            detail: detail.into(),
        }
    }

    /// Suggested delay, if the provider sent one.
    pub fn rate_limit_hint(&self) -> Option<RateLimitHint> {
        match self {
            Self::RateLimited {
                retry_after_seconds: Some(seconds),
            } => Some(RateLimitHint::new(*seconds)),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::other(error.to_string())
    }
}

/// Issues one `generateContent` call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError>;
}

/// Transport for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiTransport {
    /// Create a transport with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    /// Create a transport over a preconfigured HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::debug!(%status, "Provider returned error body: {}", error_text);
            return Err(classify_provider_error(&error_text));
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}

/// Classify a provider error body.
///
/// Only a JSON envelope whose status is `RESOURCE_EXHAUSTED` counts as a
/// rate limit. Everything else, including non-JSON bodies, is `Other`.
pub fn classify_provider_error(body: &str) -> TransportError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return TransportError::other(body.trim());
    };

    if envelope.error.status != RESOURCE_EXHAUSTED {
        return TransportError::other(format!(
            "{} {}: {}",
            envelope.error.code, envelope.error.status, envelope.error.message
        ));
    }

    let retry_after_seconds = envelope
        .error
        .details
        .iter()
        .find(|detail| detail.get("@type").and_then(Value::as_str) == Some(RETRY_INFO_TYPE))
        .and_then(|detail| detail.get("retryDelay"))
        .and_then(Value::as_str)
        .and_then(parse_retry_delay);

    TransportError::RateLimited {
        retry_after_seconds,
    }
}

/// Parse a protobuf duration string such as `"3s"` into whole seconds.
/// Fractions are truncated.
pub fn parse_retry_delay(delay: &str) -> Option<u64> {
    RETRY_DELAY
        .captures(delay)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
