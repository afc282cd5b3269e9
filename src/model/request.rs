//! Generation requests.

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

use super::schema::Schema;
use super::types::{Content, GenerateContentRequest, GenerationConfig, Modality, Part};

/// Attachment errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("Attachment is empty")]
    Empty,
    #[error("Unrecognized image format: {0}")]
    UnknownFormat(String),
}

/// An inline file sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    mime_type: String,
    data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment with an explicit MIME type.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Create an image attachment, detecting the MIME type from its magic bytes.
    pub fn image(data: Vec<u8>) -> Result<Self, AttachmentError> {
        if data.is_empty() {
            return Err(AttachmentError::Empty);
        }
        let format =
            image::guess_format(&data).map_err(|e| AttachmentError::UnknownFormat(e.to_string()))?;
        Ok(Self::new(format.to_mime_type(), data))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn to_part(&self) -> Part {
        Part::inline(self.mime_type.clone(), STANDARD.encode(&self.data))
    }
}

/// The payload shape a caller expects back.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedOutput {
    /// At least one inline image part.
    Image,
    /// Non-empty text.
    Text,
    /// A JSON object matching the schema's required fields.
    Structured(Schema),
}

/// A fully-formed generation request. Built once, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    system_instruction: Option<String>,
    attachments: Vec<Attachment>,
    expected: ExpectedOutput,
    model: Option<String>,
}

impl GenerationRequest {
    fn new(prompt: impl Into<String>, expected: ExpectedOutput) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            attachments: Vec::new(),
            expected,
            model: None,
        }
    }

    /// Request an image.
    pub fn image(prompt: impl Into<String>) -> Self {
        Self::new(prompt, ExpectedOutput::Image)
    }

    /// Request free text.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(prompt, ExpectedOutput::Text)
    }

    /// Request a JSON object conforming to `schema`.
    pub fn structured(prompt: impl Into<String>, schema: Schema) -> Self {
        Self::new(prompt, ExpectedOutput::Structured(schema))
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    /// Override the model chosen by the client for this request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn expected(&self) -> &ExpectedOutput {
        &self.expected
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Build the provider request body. Attachments precede the prompt text.
    pub fn to_wire(&self) -> GenerateContentRequest {
        let mut parts: Vec<Part> = self.attachments.iter().map(Attachment::to_part).collect();
        parts.push(Part::text(self.prompt.clone()));

        let generation_config = match &self.expected {
            ExpectedOutput::Image => Some(GenerationConfig {
                response_modalities: vec![Modality::Image],
                ..GenerationConfig::default()
            }),
            ExpectedOutput::Text => None,
            ExpectedOutput::Structured(schema) => Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema.clone()),
                ..GenerationConfig::default()
            }),
        };

        GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: self.system_instruction.as_deref().map(Content::system),
            generation_config,
        }
    }
}
