//! Image generator trait and response type.
//!
//! Defines the one-call boundary every image backend implements, plus the
//! factory that builds the configured backend.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::Config;
use crate::credential::ApiKey;
use crate::error::GenerationError;
use crate::request::GenerationRequest;

/// Decoded image bytes returned by a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// MIME type sniffed from the bytes (e.g. "image/png")
    pub mime_type: String,
}

/// Trait that all image generation backends implement.
///
/// One call to [`generate`](ImageGenerator::generate) is exactly one network
/// attempt; retries are the caller's concern. Uses `async_trait` because we
/// need `Arc<dyn ImageGenerator>` shared across worker tasks.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Perform one generation attempt and classify its outcome.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GeneratedImage, GenerationError>;

    /// Per-request timeout for this backend.
    fn timeout(&self) -> Duration;
}

/// Factory that creates the configured generator.
pub struct GeneratorFactory;

impl GeneratorFactory {
    /// Build the Gemini generator from config and a validated key.
    ///
    /// `model_override` replaces `gemini.model` when given.
    pub fn create(
        config: &Config,
        api_key: ApiKey,
        model_override: Option<&str>,
    ) -> Box<dyn ImageGenerator> {
        let mut gemini = config.gemini.clone();
        if let Some(model) = model_override {
            gemini.model = model.to_string();
        }
        Box::new(super::gemini::GeminiClient::new(
            &gemini,
            api_key,
            Duration::from_millis(config.limits.request_timeout_ms),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_applies_model_override() {
        let config = Config::default();
        let key = ApiKey::new("k").unwrap();
        let generator = GeneratorFactory::create(&config, key, Some("gemini-custom"));
        assert_eq!(generator.name(), "gemini:gemini-custom");
        assert_eq!(generator.timeout(), Duration::from_secs(60));
    }
}
