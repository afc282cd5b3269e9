//! Vibe descriptions.

use crate::config::{vibe_prompt, VIBE_SYSTEM_PROMPT};
use crate::model::{GenerationClient, GenerationRequest, ProgressObserver};

use super::StylistError;

/// Describe a fashion aesthetic for a free-text vibe.
pub async fn describe_vibe(
    client: &GenerationClient,
    vibe: &str,
    progress: &dyn ProgressObserver,
) -> Result<String, StylistError> {
    if vibe.trim().is_empty() {
        return Err(StylistError::EmptyVibe);
    }

    let request =
        GenerationRequest::text(vibe_prompt(vibe)).with_system_instruction(VIBE_SYSTEM_PROMPT);
    let output = client.generate_default(&request, progress).await?;
    output
        .into_text()
        .map(|text| text.trim().to_string())
        .ok_or(StylistError::UnexpectedOutput)
}
