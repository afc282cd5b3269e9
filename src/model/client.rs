//! Resilient generation client for the Gemini API.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::Instrument;
use uuid::Uuid;

use super::output::{extract_payload, GenerationOutput};
use super::progress::{ProgressEvent, ProgressKind, ProgressObserver};
use super::request::{ExpectedOutput, GenerationRequest};
use super::retry::{AttemptFailure, BackoffPolicy, RetryState};
use super::transport::{GeminiTransport, Transport};

/// Default attempt budget for text and structured requests.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default attempt budget for image requests.
pub const DEFAULT_IMAGE_MAX_RETRIES: u32 = 5;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Terminal generation failures. Raw provider detail is logged, never carried here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(
        "Failed to generate after multiple attempts. The AI might be busy. Please try again later."
    )]
    Exhausted { attempts: u32 },
    #[error("Retry budget must allow at least one attempt")]
    InvalidRetryBudget,
}

/// Configuration for the generation client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
    /// Attempt budget for text and structured requests.
    pub max_retries: u32,
    /// Attempt budget for image requests.
    pub image_max_retries: u32,
    pub request_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            image_max_retries: DEFAULT_IMAGE_MAX_RETRIES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Set the attempt budget for text and structured requests.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the attempt budget for image requests.
    pub fn with_image_max_retries(mut self, max_retries: u32) -> Self {
        self.image_max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Attempt budget for a request of this shape.
    pub fn max_retries_for(&self, request: &GenerationRequest) -> u32 {
        match request.expected() {
            ExpectedOutput::Image => self.image_max_retries,
            _ => self.max_retries,
        }
    }
}

/// Client that retries rate-limited generation calls.
///
/// Cloning is cheap; clones share the transport. Each `generate` call owns
/// its own retry state, so concurrent calls do not interfere.
#[derive(Clone)]
pub struct GenerationClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl GenerationClient {
    /// Create a client over an explicit transport.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Create a client talking to the Gemini REST API.
    pub fn gemini(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let transport =
            GeminiTransport::new(&config.base_url, &config.api_key, config.request_timeout)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn model_for<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        request.model().unwrap_or(match request.expected() {
            ExpectedOutput::Image => self.config.image_model.as_str(),
            _ => self.config.text_model.as_str(),
        })
    }

    /// Generate with the configured attempt budget for this request shape.
    pub async fn generate_default(
        &self,
        request: &GenerationRequest,
        progress: &dyn ProgressObserver,
    ) -> Result<GenerationOutput, GenerationError> {
        self.generate(request, self.config.max_retries_for(request), progress)
            .await
    }

    /// Send `request`, retrying rate-limited attempts up to `max_retries` total attempts.
    ///
    /// Emits one `Started` event, then one `Retrying` event before each
    /// backoff sleep. Any failure other than a rate limit stops the loop at
    /// once. The final attempt never sleeps.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        max_retries: u32,
        progress: &dyn ProgressObserver,
    ) -> Result<GenerationOutput, GenerationError> {
        if max_retries == 0 {
            return Err(GenerationError::InvalidRetryBudget);
        }

        let call_id = Uuid::new_v4();
        let model = self.model_for(request);
        let span = tracing::info_span!("generate", %call_id, model, max_retries);

        async move {
            let body = request.to_wire();
            let mut state = RetryState::new(max_retries);

            progress.on_progress(&ProgressEvent::new(
                call_id,
                ProgressKind::Started {
                    max_attempts: max_retries,
                },
            ));

            loop {
                tracing::debug!(attempt = state.attempts_made(), "Sending generation request");

                let failure = match self.transport.generate_content(model, &body).await {
                    Ok(response) => match extract_payload(request.expected(), &response) {
                        Ok(output) => {
                            tracing::info!(attempts = state.attempts_made(), "Generation succeeded");
                            return Ok(output);
                        }
                        Err(missing) => AttemptFailure::from(missing),
                    },
                    Err(error) => AttemptFailure::from(error),
                };

                tracing::warn!(
                    "Generation attempt {}/{} failed: {}",
                    state.attempts_made(),
                    max_retries,
                    failure
                );

                let Some(delay) =
                    state.record_failure(&failure, &self.config.backoff, &mut rand::rng())
                else {
                    break;
                };

                let event = ProgressEvent::new(
                    call_id,
                    ProgressKind::Retrying {
                        delay,
                        next_attempt: state.attempt() + 2,
                        max_attempts: max_retries,
                    },
                );
                tracing::info!("{}", event);
                progress.on_progress(&event);

                sleep(delay).await;
                state.advance();
            }

            tracing::error!(
                attempts = state.attempts_made(),
                "Final error after all retries: {}",
                state.last_error().unwrap_or("unknown error")
            );
            Err(GenerationError::Exhausted {
                attempts: state.attempts_made(),
            })
        }
        .instrument(span)
        .await
    }
}
