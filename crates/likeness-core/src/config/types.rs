//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::Category;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root of the output tree (`<output_dir>/<influencer>/<Category>/<n>.<ext>`)
    pub output_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Batch generation settings: retries, concurrency and resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum API attempts per work item (first try included)
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,

    /// Work items in flight at once (1 = sequential)
    pub concurrency: usize,

    /// Skip work items whose output file already exists
    pub resume: bool,

    /// Wait between successive API dispatches in milliseconds
    pub pace_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            concurrency: 1,
            resume: true,
            pace_ms: 3000,
        }
    }
}

/// Resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-request timeout for the image API in milliseconds
    pub request_timeout_ms: u64,

    /// Maximum base image size in megabytes
    pub max_input_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 60_000,
            max_input_size_mb: 20,
        }
    }
}

/// Gemini image API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API base URL (without the `/models/...` suffix)
    pub endpoint: String,

    /// Image generation model
    pub model: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Concurrent requests the service tolerates for one key
    pub max_concurrent_requests: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-image-preview".to_string(),
            api_key: "${GEMINI_API_KEY}".to_string(),
            max_concurrent_requests: 4,
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Extension of generated files (without the dot)
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: "png".to_string(),
        }
    }
}

/// One expression prompt per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub neutral: String,
    pub crying: String,
    pub snapchat: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            neutral: "neutral expression, studio lighting".to_string(),
            crying: "crying expression, emotional".to_string(),
            snapchat: "snapchat-filter style, casual selfie".to_string(),
        }
    }
}

impl PromptConfig {
    /// The expression prompt for a category.
    pub fn for_category(&self, category: Category) -> &str {
        match category {
            Category::Neutral => &self.neutral,
            Category::Crying => &self.crying,
            Category::Snapchat => &self.snapchat,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
