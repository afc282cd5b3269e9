//! Successful generation payloads and their extraction from provider responses.

use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::request::ExpectedOutput;
use super::types::{GenerateContentResponse, Part};

const DEFAULT_IMAGE_MIME: &str = "image/png";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid code fence regex")
});

/// A well-formed response that lacked the expected payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MissingPayload {
    #[error("No candidates in response")]
    NoCandidates,
    #[error("Candidate has no content parts")]
    NoParts,
    #[error("Image generation succeeded but no image data was returned")]
    NoImage,
    #[error("Inline image data is not valid base64: {0}")]
    InvalidImageData(String),
    #[error("Response contained no text")]
    NoText,
    #[error("Structured response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Structured response is not a JSON object")]
    NotAnObject,
    #[error("Structured response is missing required field `{0}`")]
    MissingField(String),
}

/// Decoded image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    mime_type: String,
    bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encode as a `data:` URI suitable for an `<img src>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// A successful generation result.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    Image(ImageData),
    Text(String),
    Structured(Value),
}

impl GenerationOutput {
    pub fn into_image(self) -> Option<ImageData> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_structured(self) -> Option<Value> {
        match self {
            Self::Structured(value) => Some(value),
            _ => None,
        }
    }

    /// Deserialize a structured payload into `T`.
    ///
    /// Returns `None` when the output is not structured.
    pub fn decode<T: DeserializeOwned>(self) -> Option<Result<T, serde_json::Error>> {
        self.into_structured().map(serde_json::from_value)
    }
}

/// Pull the expected payload out of a provider response.
///
/// Only the first candidate is inspected. Thought parts never count as payload.
pub fn extract_payload(
    expected: &ExpectedOutput,
    response: &GenerateContentResponse,
) -> Result<GenerationOutput, MissingPayload> {
    if response.candidates.is_empty() {
        return Err(MissingPayload::NoCandidates);
    }
    let parts = match response.first_candidate_parts() {
        Some(parts) if !parts.is_empty() => parts,
        _ => return Err(MissingPayload::NoParts),
    };

    match expected {
        ExpectedOutput::Image => extract_image(parts).map(GenerationOutput::Image),
        ExpectedOutput::Text => extract_text(parts).map(GenerationOutput::Text),
        ExpectedOutput::Structured(schema) => {
            let text = extract_text(parts)?;
            let value = parse_object(&text)?;
            if let Some(field) = schema
                .required_fields()
                .iter()
                .find(|field| value.get(field.as_str()).map_or(true, Value::is_null))
            {
                return Err(MissingPayload::MissingField(field.clone()));
            }
            Ok(GenerationOutput::Structured(value))
        }
    }
}

fn extract_image(parts: &[Part]) -> Result<ImageData, MissingPayload> {
    let inline = parts
        .iter()
        .filter(|part| !part.is_thought())
        .find_map(|part| part.inline_data.as_ref())
        .ok_or(MissingPayload::NoImage)?;

    let bytes = STANDARD
        .decode(inline.data.trim())
        .map_err(|e| MissingPayload::InvalidImageData(e.to_string()))?;
    if bytes.is_empty() {
        return Err(MissingPayload::NoImage);
    }

    let mime_type = if inline.mime_type.is_empty() {
        DEFAULT_IMAGE_MIME
    } else {
        inline.mime_type.as_str()
    };
    Ok(ImageData::new(mime_type, bytes))
}

fn extract_text(parts: &[Part]) -> Result<String, MissingPayload> {
    let text: String = parts
        .iter()
        .filter(|part| !part.is_thought())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        Err(MissingPayload::NoText)
    } else {
        Ok(text)
    }
}

fn parse_object(text: &str) -> Result<Value, MissingPayload> {
    let body = CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str());

    let value: Value =
        serde_json::from_str(body.trim()).map_err(|e| MissingPayload::InvalidJson(e.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(MissingPayload::NotAnObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::Schema;
    use crate::model::testing::response_with;
    use crate::model::types::GenerateContentResponse;
    use serde_json::json;

    fn outfit_schema() -> Schema {
        Schema::object()
            .required_property("productIds", Schema::array(Schema::string()))
            .required_property("description", Schema::string())
    }

    #[test]
    fn test_image_becomes_data_uri() {
        let response = response_with(vec![
            Part::text("Here is your model"),
            Part::inline("image/png", "aGVsbG8="),
        ]);

        let output = extract_payload(&ExpectedOutput::Image, &response).unwrap();
        let image = output.into_image().unwrap();
        assert_eq!(image.bytes(), b"hello");
        assert_eq!(image.to_data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_image_without_mime_defaults_to_png() {
        let response = response_with(vec![Part::inline("", "aGVsbG8=")]);
        let image = extract_payload(&ExpectedOutput::Image, &response)
            .unwrap()
            .into_image()
            .unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn test_empty_parts_is_missing_payload() {
        let response = response_with(Vec::new());
        assert_eq!(
            extract_payload(&ExpectedOutput::Image, &response),
            Err(MissingPayload::NoParts)
        );
        assert_eq!(
            extract_payload(&ExpectedOutput::Text, &GenerateContentResponse::default()),
            Err(MissingPayload::NoCandidates)
        );
    }

    #[test]
    fn test_text_only_response_has_no_image() {
        let response = response_with(vec![Part::text("I cannot draw that")]);
        assert_eq!(
            extract_payload(&ExpectedOutput::Image, &response),
            Err(MissingPayload::NoImage)
        );
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let response = response_with(vec![Part::inline("image/png", "@@not base64@@")]);
        assert!(matches!(
            extract_payload(&ExpectedOutput::Image, &response),
            Err(MissingPayload::InvalidImageData(_))
        ));
    }

    #[test]
    fn test_thought_text_is_ignored() {
        let mut thought = Part::text("pondering");
        thought.thought = Some(true);
        let response = response_with(vec![thought, Part::text("Linen and ochre.")]);

        let text = extract_payload(&ExpectedOutput::Text, &response)
            .unwrap()
            .into_text()
            .unwrap();
        assert_eq!(text, "Linen and ochre.");
    }

    #[test]
    fn test_structured_accepts_fenced_json() {
        let response = response_with(vec![Part::text(
            "```json\n{\"productIds\": [\"prod-001\"], \"description\": \"breezy\"}\n```",
        )]);

        let value = extract_payload(&ExpectedOutput::Structured(outfit_schema()), &response)
            .unwrap()
            .into_structured()
            .unwrap();
        assert_eq!(value["productIds"], json!(["prod-001"]));
    }

    #[test]
    fn test_structured_requires_fields() {
        let response = response_with(vec![Part::text("{\"productIds\": []}")]);
        assert_eq!(
            extract_payload(&ExpectedOutput::Structured(outfit_schema()), &response),
            Err(MissingPayload::MissingField("description".to_string()))
        );

        let response = response_with(vec![Part::text("[1, 2]")]);
        assert_eq!(
            extract_payload(&ExpectedOutput::Structured(outfit_schema()), &response),
            Err(MissingPayload::NotAnObject)
        );

        let response = response_with(vec![Part::text("{ nope")]);
        assert!(matches!(
            extract_payload(&ExpectedOutput::Structured(outfit_schema()), &response),
            Err(MissingPayload::InvalidJson(_))
        ));
    }
}
