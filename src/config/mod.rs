//! Configuration module: prompts for the stylist features.

mod prompts;

pub use prompts::{
    model_image_prompt, outfit_prompt, product_listing, vibe_prompt, visual_search_prompt,
    OUTFIT_SYSTEM_PROMPT, VIBE_SYSTEM_PROMPT, VISUAL_SEARCH_SYSTEM_PROMPT,
};
