//! Visual search by image attachment.

use serde::Deserialize;

use crate::config::{visual_search_prompt, VISUAL_SEARCH_SYSTEM_PROMPT};
use crate::model::{Attachment, GenerationClient, GenerationRequest, ProgressObserver, Schema};

use super::catalog::{dedupe_by_id, resolve_ids, Product};
use super::StylistError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    product_ids: Vec<String>,
}

/// Response schema for visual search.
pub fn visual_search_schema() -> Schema {
    Schema::object().required_property(
        "productIds",
        Schema::array(Schema::string())
            .with_description("IDs of visually similar products, best match first."),
    )
}

/// Find catalog products that look like the attached images.
///
/// `query` may be empty. Returns matches in the model's ranking order;
/// an empty result is not an error.
pub async fn search_with_attachments(
    client: &GenerationClient,
    query: &str,
    attachments: Vec<Attachment>,
    products: &[Product],
    progress: &dyn ProgressObserver,
) -> Result<Vec<Product>, StylistError> {
    if attachments.is_empty() {
        return Err(StylistError::NoAttachments);
    }
    let catalog = dedupe_by_id(products.iter().cloned());
    if catalog.is_empty() {
        return Err(StylistError::NoProducts);
    }

    let request = GenerationRequest::structured(
        visual_search_prompt(query, &catalog),
        visual_search_schema(),
    )
    .with_system_instruction(VISUAL_SEARCH_SYSTEM_PROMPT)
    .with_attachments(attachments);

    let response = client
        .generate_default(&request, progress)
        .await?
        .decode::<SearchResponse>()
        .ok_or(StylistError::UnexpectedOutput)??;

    let matches = resolve_ids(&response.product_ids, &catalog);
    tracing::info!(matches = matches.len(), "Visual search finished");
    Ok(matches)
}
