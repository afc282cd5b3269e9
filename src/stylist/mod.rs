//! Stylist features built on the generation client.

mod catalog;
mod model_image;
mod outfit;
mod vibe;
mod visual_search;

use thiserror::Error;

use crate::model::{AttachmentError, GenerationError};

pub use catalog::{dedupe_by_id, demo_catalog, resolve_ids, Product, Size};
pub use model_image::{generate_model_image, BodyType, SkinTone};
pub use outfit::{generate_outfit, outfit_schema, Outfit};
pub use vibe::describe_vibe;
pub use visual_search::{search_with_attachments, visual_search_schema};

/// Stylist feature errors.
#[derive(Error, Debug)]
pub enum StylistError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Please describe a vibe first")]
    EmptyVibe,
    #[error("Add items to your closet or wishlist to generate an outfit")]
    NoProducts,
    #[error("Please attach at least one image to search")]
    NoAttachments,
    #[error("The AI stylist couldn't find a matching outfit from your items")]
    NoMatchingOutfit,
    #[error("Unknown body type: {0}")]
    UnknownBodyType(String),
    #[error("Unknown skin tone: {0}")]
    UnknownSkinTone(String),
    #[error("Unexpected output kind from the model")]
    UnexpectedOutput,
    #[error("Failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}
