//! Image generation API client.
//!
//! Provides the one-attempt [`ImageGenerator`] abstraction and its Gemini
//! implementation. No retry logic lives here.

pub(crate) mod gemini;
pub(crate) mod provider;

pub use gemini::{classify_status, decode_response, GeminiClient};
pub use provider::{GeneratedImage, GeneratorFactory, ImageGenerator};
