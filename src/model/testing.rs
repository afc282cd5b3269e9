//! Test doubles for the generation client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::client::{ClientConfig, GenerationClient};
use super::progress::{ProgressEvent, ProgressKind, ProgressObserver};
use super::transport::{Transport, TransportError};
use super::types::{Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part};

type Scripted = Result<GenerateContentResponse, TransportError>;

/// Replays queued results in order; fails once the script runs out.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(String, GenerateContentRequest)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn models(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(_, request)| request.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::other("script exhausted")))
    }
}

/// Client over a scripted transport with default configuration.
pub fn scripted_client(script: Vec<Scripted>) -> (GenerationClient, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new(script));
    let client = GenerationClient::new(ClientConfig::default(), transport.clone());
    (client, transport)
}

/// Collects every progress event.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn call_ids(&self) -> Vec<Uuid> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.call_id)
            .collect()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event.kind {
                ProgressKind::Retrying { delay, .. } => Some(delay),
                ProgressKind::Started { .. } => None,
            })
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn response_with(parts: Vec<Part>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content {
                role: Some("model".to_string()),
                parts,
            }),
            finish_reason: Some("STOP".to_string()),
        }],
        prompt_feedback: None,
    }
}

pub fn image_response(base64_data: &str) -> GenerateContentResponse {
    response_with(vec![Part::inline("image/png", base64_data)])
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    response_with(vec![Part::text(text)])
}

pub fn empty_parts_response() -> GenerateContentResponse {
    response_with(Vec::new())
}

pub fn rate_limited(retry_after_seconds: Option<u64>) -> TransportError {
    TransportError::RateLimited {
        retry_after_seconds,
    }
}

pub fn plain_error() -> TransportError {
    TransportError::other("error sending request: connection refused")
}
