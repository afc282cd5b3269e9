//! Outfit recommendations from the user's closet and wishlist.

use serde::{Deserialize, Serialize};

use crate::config::{outfit_prompt, OUTFIT_SYSTEM_PROMPT};
use crate::model::{GenerationClient, GenerationRequest, ProgressObserver, Schema};

use super::catalog::{dedupe_by_id, resolve_ids, Product};
use super::StylistError;

/// Raw structured answer from the model.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutfitResponse {
    outfit_name: String,
    advice: String,
    product_ids: Vec<String>,
}

/// A generated outfit with its products resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outfit {
    pub name: String,
    /// Stylist's advice on wearing the outfit.
    pub advice: String,
    pub products: Vec<Product>,
}

/// Response schema for outfit generation.
pub fn outfit_schema() -> Schema {
    Schema::object()
        .required_property(
            "outfitName",
            Schema::string().with_description("A short, catchy name for the outfit."),
        )
        .required_property(
            "advice",
            Schema::string()
                .with_description("Short stylist's advice on why and how to wear these items."),
        )
        .required_property(
            "productIds",
            Schema::array(Schema::string())
                .with_description("IDs of the products that make up the outfit."),
        )
}

/// Build an outfit for `vibe` from `products`.
///
/// Duplicate products are merged by id before prompting. Ids the model
/// invents are dropped; an outfit with no known products is an error.
pub async fn generate_outfit(
    client: &GenerationClient,
    vibe: &str,
    products: &[Product],
    progress: &dyn ProgressObserver,
) -> Result<Outfit, StylistError> {
    if vibe.trim().is_empty() {
        return Err(StylistError::EmptyVibe);
    }
    let available = dedupe_by_id(products.iter().cloned());
    if available.is_empty() {
        return Err(StylistError::NoProducts);
    }

    let request = GenerationRequest::structured(outfit_prompt(vibe, &available), outfit_schema())
        .with_system_instruction(OUTFIT_SYSTEM_PROMPT);
    let response: OutfitResponse = client
        .generate_default(&request, progress)
        .await?
        .decode::<OutfitResponse>()
        .ok_or(StylistError::UnexpectedOutput)??;

    let products = resolve_ids(&response.product_ids, &available);
    if products.is_empty() {
        return Err(StylistError::NoMatchingOutfit);
    }

    tracing::info!(
        outfit = %response.outfit_name,
        items = products.len(),
        "Generated outfit"
    );
    Ok(Outfit {
        name: response.outfit_name,
        advice: response.advice,
        products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{empty_parts_response, scripted_client, text_response};
    use crate::model::{GenerationError, NoProgress};
    use crate::stylist::demo_catalog;

    #[tokio::test]
    async fn test_outfit_resolves_known_ids() {
        let (client, transport) = scripted_client(vec![Ok(text_response(
            r#"{"outfitName":"Weekend Ease","advice":"Relaxed layers.","productIds":["prod-002","prod-404","prod-003"]}"#,
        ))]);

        let outfit = generate_outfit(&client, "relaxed weekend", &demo_catalog(), &NoProgress)
            .await
            .unwrap();
        assert_eq!(outfit.name, "Weekend Ease");
        assert_eq!(outfit.advice, "Relaxed layers.");
        let ids: Vec<&str> = outfit.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["prod-002", "prod-003"]);

        let request = transport.last_request().unwrap();
        let config = request.generation_config.unwrap();
        assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
        assert_eq!(
            config.response_schema.unwrap().required_fields(),
            ["outfitName", "advice", "productIds"]
        );
        let prompt = request.contents[0].parts[0].text.clone().unwrap();
        assert!(prompt.contains("id: prod-008"));
    }

    #[tokio::test]
    async fn test_outfit_with_only_unknown_ids() {
        let (client, _) = scripted_client(vec![Ok(text_response(
            r#"{"outfitName":"Ghost","advice":"Nothing.","productIds":["nope"]}"#,
        ))]);
        assert!(matches!(
            generate_outfit(&client, "minimal", &demo_catalog(), &NoProgress).await,
            Err(StylistError::NoMatchingOutfit)
        ));
    }

    #[tokio::test]
    async fn test_outfit_input_validation() {
        let (client, transport) = scripted_client(Vec::new());
        assert!(matches!(
            generate_outfit(&client, "", &demo_catalog(), &NoProgress).await,
            Err(StylistError::EmptyVibe)
        ));
        assert!(matches!(
            generate_outfit(&client, "boho", &[], &NoProgress).await,
            Err(StylistError::NoProducts)
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_outfit_missing_payload_is_not_retried() {
        let (client, transport) = scripted_client(vec![Ok(empty_parts_response())]);
        assert!(matches!(
            generate_outfit(&client, "boho", &demo_catalog(), &NoProgress).await,
            Err(StylistError::Generation(GenerationError::Exhausted { attempts: 1 }))
        ));
        assert_eq!(transport.calls(), 1);
    }
}
