// Copyright 2025 Arkaenia
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Arkaenia Stylist
//!
//! AI stylist client for the Arkaenia fashion storefront.
//!
//! The core is a resilient generation client for the Gemini API: it
//! retries rate-limited calls with server-hinted or exponential backoff,
//! reports progress to the caller, and extracts image, text or structured
//! JSON payloads. The stylist features (vibe descriptions, outfits, model
//! try-on, visual search) are thin async functions on top of it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use arkaenia_stylist::{describe_vibe, AiSettings, GenerationClient, ProgressEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = AiSettings::from_env()?;
//!     let client = GenerationClient::gemini(settings.client_config())?;
//!
//!     let progress = |event: &ProgressEvent| println!("{}", event);
//!     let text = describe_vibe(&client, "coastal grandma", &progress).await?;
//!
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod model;
pub mod settings;
pub mod stylist;

pub use model::{
    Attachment, ClientConfig, GenerationClient, GenerationError, GenerationOutput,
    GenerationRequest, ImageData, NoProgress, ProgressEvent, ProgressObserver, Schema,
};
pub use settings::{AiSettings, SettingsError};
pub use stylist::{
    describe_vibe, generate_model_image, generate_outfit, search_with_attachments, BodyType,
    Outfit, Product, SkinTone, StylistError,
};
