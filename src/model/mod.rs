//! Model client module for Gemini content generation.

mod client;
mod output;
mod progress;
mod request;
mod retry;
mod schema;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    ClientConfig, GenerationClient, GenerationError, DEFAULT_BASE_URL, DEFAULT_IMAGE_MAX_RETRIES,
    DEFAULT_IMAGE_MODEL, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TEXT_MODEL,
};
pub use output::{extract_payload, GenerationOutput, ImageData, MissingPayload};
pub use progress::{NoProgress, ProgressEvent, ProgressKind, ProgressObserver};
pub use request::{Attachment, AttachmentError, ExpectedOutput, GenerationRequest};
pub use retry::{AttemptFailure, BackoffPolicy, FailureClass, RateLimitHint, RetryState};
pub use schema::{Schema, SchemaType};
pub use transport::{
    classify_provider_error, parse_retry_delay, GeminiTransport, Transport, TransportError,
    RESOURCE_EXHAUSTED, RETRY_INFO_TYPE,
};
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Modality, Part,
};
