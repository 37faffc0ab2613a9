//! Request construction for the image generation API.
//!
//! A [`GenerationRequest`] is an immutable value built from the base image,
//! the work item's identity and the category prompt. Building is pure: the
//! same inputs always produce the same prompt text and payload.

use base64::Engine;

use crate::config::PromptConfig;
use crate::error::GenerationError;
use crate::input::BaseImage;
use crate::types::{Category, WorkKey, VARIANTS_PER_CATEGORY};

/// Base64-encoded image ready to send to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }
}

/// Category → expression prompt table, one prompt per category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptTable {
    prompts: PromptConfig,
}

impl PromptTable {
    pub fn new(prompts: PromptConfig) -> Self {
        Self { prompts }
    }

    /// The expression prompt for a category.
    pub fn expression(&self, category: Category) -> &str {
        self.prompts.for_category(category).trim()
    }

    /// Full prompt text sent for a category.
    ///
    /// The variant index is deliberately not an input: the variants of a
    /// category share one prompt and differ only through sampling.
    pub fn render(&self, category: Category) -> String {
        format!(
            "Create a variation of this selfie image with the following changes:\n\
             \n\
             1. EXPRESSION: {expression}.\n\
             \n\
             2. REQUIREMENTS:\n\
             \x20  - Keep the same person's face and general pose\n\
             \x20  - Maintain the selfie/portrait style composition\n\
             \x20  - Keep the original setting, with at most a slight change in perspective\n\
             \x20  - Keep lighting natural and consistent with the original\n\
             \x20  - No artifacts on the image\n\
             \n\
             Generate a high-quality, realistic variation that maintains the original's \
             authenticity while incorporating these changes.",
            expression = self.expression(category)
        )
    }
}

/// Fully formed payload for one work item attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub influencer_id: String,
    pub category: Category,
    pub variant_index: u8,
    pub prompt: String,
    pub image: ImageInput,
}

impl GenerationRequest {
    /// Build the request for one work item.
    pub fn build(
        image: &[u8],
        media_type: &str,
        influencer_id: &str,
        category: Category,
        variant_index: u8,
        prompts: &PromptTable,
    ) -> Result<Self, GenerationError> {
        if image.is_empty() {
            return Err(GenerationError::InvalidInput(
                "base image buffer is empty".to_string(),
            ));
        }
        if influencer_id.trim().is_empty() {
            return Err(GenerationError::InvalidInput(
                "influencer identifier is empty".to_string(),
            ));
        }
        if !(1..=VARIANTS_PER_CATEGORY).contains(&variant_index) {
            return Err(GenerationError::InvalidInput(format!(
                "variant index {variant_index} outside 1..={VARIANTS_PER_CATEGORY}"
            )));
        }

        Ok(Self {
            influencer_id: influencer_id.to_string(),
            category,
            variant_index,
            prompt: prompts.render(category),
            image: ImageInput::from_bytes(image, media_type),
        })
    }

    /// Build from a loaded base image.
    pub fn for_base(
        base: &BaseImage,
        key: WorkKey,
        prompts: &PromptTable,
    ) -> Result<Self, GenerationError> {
        Self::build(
            &base.bytes,
            &base.mime_type,
            &base.influencer_id,
            key.category,
            key.variant_index,
            prompts,
        )
    }

    pub fn key(&self) -> WorkKey {
        WorkKey {
            category: self.category,
            variant_index: self.variant_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(category: Category, variant_index: u8) -> GenerationRequest {
        GenerationRequest::build(
            &[1, 2, 3],
            "image/png",
            "zed",
            category,
            variant_index,
            &PromptTable::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build(Category::Crying, 2), build(Category::Crying, 2));
    }

    #[test]
    fn test_variant_index_does_not_change_prompt() {
        let first = build(Category::Snapchat, 1);
        for variant in 2..=5 {
            let other = build(Category::Snapchat, variant);
            assert_eq!(first.prompt, other.prompt);
            assert_eq!(first.image, other.image);
        }
    }

    #[test]
    fn test_categories_get_distinct_prompts() {
        let neutral = build(Category::Neutral, 1);
        let crying = build(Category::Crying, 1);
        let snapchat = build(Category::Snapchat, 1);
        assert!(neutral.prompt.contains("neutral expression, studio lighting"));
        assert!(crying.prompt.contains("crying expression, emotional"));
        assert!(snapchat.prompt.contains("snapchat-filter style, casual selfie"));
        assert_ne!(neutral.prompt, crying.prompt);
    }

    #[test]
    fn test_image_payload_is_base64() {
        let request = build(Category::Neutral, 1);
        assert_eq!(request.image.data, "AQID");
        assert_eq!(request.image.media_type, "image/png");
    }

    #[test]
    fn test_empty_inputs_are_invalid() {
        let prompts = PromptTable::default();
        let err =
            GenerationRequest::build(&[], "image/png", "zed", Category::Neutral, 1, &prompts)
                .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)));

        let err =
            GenerationRequest::build(&[1], "image/png", "  ", Category::Neutral, 1, &prompts)
                .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)));

        let err =
            GenerationRequest::build(&[1], "image/png", "zed", Category::Neutral, 6, &prompts)
                .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)));
    }

    #[test]
    fn test_prompt_override_is_used() {
        let prompts = PromptTable::new(PromptConfig {
            crying: "sobbing quietly".to_string(),
            ..PromptConfig::default()
        });
        assert!(prompts.render(Category::Crying).contains("sobbing quietly."));
    }
}
