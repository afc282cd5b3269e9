//! Prompts for the AI stylist features.

use crate::stylist::Product;

/// System instruction for vibe descriptions.
pub static VIBE_SYSTEM_PROMPT: &str = r#"You are an expert fashion stylist named Arkaenia. A user is looking for a style that matches a "vibe" they've described.
Based on their vibe, describe a fashion aesthetic for them in 2-3 short, inspirational, and friendly paragraphs.
Suggest specific clothing items, fabrics, or colors that fit the aesthetic.
Do not mention prices or specific stores. The goal is to inspire, not to sell."#;

/// System instruction for outfit recommendations.
pub static OUTFIT_SYSTEM_PROMPT: &str = r#"You are Arkaenia, a personal fashion stylist.
You build outfits strictly from the user's own closet and wishlist.
Only use product IDs from the provided list. Never invent products.
Pick 2 to 4 items that work together and match the requested vibe.
If nothing fits, return an empty productIds list."#;

/// System instruction for visual search.
pub static VISUAL_SEARCH_SYSTEM_PROMPT: &str = r#"You are a visual search engine for a fashion store.
Compare the attached images against the product catalog and return the IDs of the most visually similar products, best match first.
Only use product IDs from the provided catalog. Return an empty list if nothing is similar."#;

/// Render products as one line each for inclusion in a prompt.
pub fn product_listing(products: &[Product]) -> String {
    products
        .iter()
        .map(|product| {
            let mut line = format!(
                "- id: {} | {} by {} | price: {:.2}",
                product.id, product.name, product.brand, product.price
            );
            if let Some(color) = &product.color {
                line.push_str(&format!(" | color: {}", color));
            }
            if let Some(size) = &product.size {
                line.push_str(&format!(" | size: {}", size));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// User prompt for a vibe description.
pub fn vibe_prompt(vibe: &str) -> String {
    format!("User's Vibe: \"{}\"", vibe.trim())
}

/// User prompt for an outfit built from `products`.
pub fn outfit_prompt(vibe: &str, products: &[Product]) -> String {
    format!(
        "Vibe: \"{}\"\n\nAvailable items:\n{}\n\nCreate an outfit name, a short piece of styling advice and the list of product IDs that make up the outfit.",
        vibe.trim(),
        product_listing(products)
    )
}

/// Prompt for a full-body model wearing a single product.
pub fn model_image_prompt(product: &Product, body_type: &str, skin_tone: &str) -> String {
    format!(
        "A realistic, full-body, front-facing fashion photo of a model.\n\
         - Body Type: {}.\n\
         - Skin Tone: {}.\n\
         - Outfit: The model is wearing a single clothing item: a {} by {}.\n\
         - Setting: Clean, minimalist studio with neutral lighting.",
        body_type, skin_tone, product.name, product.brand
    )
}

/// User prompt for visual search over `products`.
pub fn visual_search_prompt(query: &str, products: &[Product]) -> String {
    let query = query.trim();
    let query = if query.is_empty() {
        "Find products similar to the attached images."
    } else {
        query
    };
    format!(
        "{}\n\nProduct catalog:\n{}",
        query,
        product_listing(products)
    )
}
