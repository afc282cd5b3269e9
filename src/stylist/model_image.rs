//! Virtual try-on: a model wearing a product.

use std::fmt;
use std::str::FromStr;

use crate::config::model_image_prompt;
use crate::model::{GenerationClient, GenerationRequest, ImageData, ProgressObserver};

use super::catalog::Product;
use super::StylistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Hourglass,
    Pear,
    Apple,
    Athletic,
}

impl BodyType {
    pub const ALL: [BodyType; 4] = [
        BodyType::Hourglass,
        BodyType::Pear,
        BodyType::Apple,
        BodyType::Athletic,
    ];
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyType::Hourglass => "Hourglass",
            BodyType::Pear => "Pear",
            BodyType::Apple => "Apple",
            BodyType::Athletic => "Athletic",
        };
        f.write_str(name)
    }
}

impl FromStr for BodyType {
    type Err = StylistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|body| body.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StylistError::UnknownBodyType(s.to_string()))
    }
}

/// Skin tone swatches offered by the try-on page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinTone {
    Light,
    Tan,
    MediumBrown,
    DarkBrown,
}

impl SkinTone {
    pub const ALL: [SkinTone; 4] = [
        SkinTone::Light,
        SkinTone::Tan,
        SkinTone::MediumBrown,
        SkinTone::DarkBrown,
    ];

    pub fn hex(&self) -> &'static str {
        match self {
            SkinTone::Light => "#F2D0B1",
            SkinTone::Tan => "#C68642",
            SkinTone::MediumBrown => "#8D5524",
            SkinTone::DarkBrown => "#3E2412",
        }
    }

    /// Wording used in the image prompt.
    pub fn description(&self) -> &'static str {
        match self {
            SkinTone::Light => "a light skin tone",
            SkinTone::Tan => "a tan skin tone",
            SkinTone::MediumBrown => "a medium brown skin tone",
            SkinTone::DarkBrown => "a dark brown skin tone",
        }
    }
}

impl FromStr for SkinTone {
    type Err = StylistError;

    /// Accepts the swatch hex with or without `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('#');
        Self::ALL
            .into_iter()
            .find(|tone| tone.hex()[1..].eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StylistError::UnknownSkinTone(s.to_string()))
    }
}

/// Generate a studio photo of a model wearing `product`.
///
/// Uses the image model and the image attempt budget.
pub async fn generate_model_image(
    client: &GenerationClient,
    product: &Product,
    body_type: BodyType,
    skin_tone: SkinTone,
    progress: &dyn ProgressObserver,
) -> Result<ImageData, StylistError> {
    let prompt = model_image_prompt(product, &body_type.to_string(), skin_tone.description());
    let request = GenerationRequest::image(prompt);

    tracing::info!(product = %product.id, %body_type, skin = skin_tone.hex(), "Generating model image");
    client
        .generate_default(&request, progress)
        .await?
        .into_image()
        .ok_or(StylistError::UnexpectedOutput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{image_response, rate_limited, scripted_client, RecordingObserver};
    use crate::model::{GenerationError, Modality};
    use crate::stylist::demo_catalog;

    #[test]
    fn test_parse_body_type_and_skin_tone() {
        assert_eq!("athletic".parse::<BodyType>().unwrap(), BodyType::Athletic);
        assert!(matches!(
            "triangle".parse::<BodyType>(),
            Err(StylistError::UnknownBodyType(_))
        ));

        assert_eq!("#c68642".parse::<SkinTone>().unwrap(), SkinTone::Tan);
        assert_eq!("3E2412".parse::<SkinTone>().unwrap(), SkinTone::DarkBrown);
        assert!(matches!(
            "#000000".parse::<SkinTone>(),
            Err(StylistError::UnknownSkinTone(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_image_retries_then_returns_data_uri() {
        let (client, transport) = scripted_client(vec![
            Err(rate_limited(Some(2))),
            Ok(image_response("aGVsbG8=")),
        ]);
        let observer = RecordingObserver::default();
        let product = demo_catalog().remove(0);

        let image = generate_model_image(
            &client,
            &product,
            BodyType::Pear,
            SkinTone::MediumBrown,
            &observer,
        )
        .await
        .unwrap();
        assert_eq!(image.to_data_uri(), "data:image/png;base64,aGVsbG8=");

        let messages = observer.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].ends_with("(Attempt 2/5)"));

        assert_eq!(transport.models(), vec!["gemini-2.5-flash-image"; 2]);
        let request = transport.last_request().unwrap();
        assert_eq!(
            request.generation_config.unwrap().response_modalities,
            vec![Modality::Image]
        );
        let prompt = request.contents[0].parts[0].text.clone().unwrap();
        assert!(prompt.contains("Body Type: Pear."));
        assert!(prompt.contains("Skin Tone: a medium brown skin tone."));
        assert!(prompt.contains("Oversized Linen Shirt by Urban Threads"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_image_uses_image_budget() {
        let (client, transport) =
            scripted_client((0..5).map(|_| Err(rate_limited(None))).collect());
        let product = demo_catalog().remove(1);

        let result = generate_model_image(
            &client,
            &product,
            BodyType::Hourglass,
            SkinTone::Light,
            &RecordingObserver::default(),
        )
        .await;
        assert!(matches!(
            result,
            Err(StylistError::Generation(GenerationError::Exhausted { attempts: 5 }))
        ));
        assert_eq!(transport.calls(), 5);
    }
}
