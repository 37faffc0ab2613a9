//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_attempts must be > 0".into(),
            ));
        }
        if self.generation.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "generation.concurrency must be > 0".into(),
            ));
        }
        if self.generation.concurrency > self.gemini.max_concurrent_requests {
            return Err(ConfigError::ValidationError(format!(
                "generation.concurrency ({}) exceeds gemini.max_concurrent_requests ({})",
                self.generation.concurrency, self.gemini.max_concurrent_requests
            )));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.max_input_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_input_size_mb must be > 0".into(),
            ));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gemini.model must not be empty".into(),
            ));
        }
        let ext = self.output.extension.trim();
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(ConfigError::ValidationError(
                "output.extension must be a bare extension like \"png\"".into(),
            ));
        }
        for (name, prompt) in [
            ("neutral", &self.prompts.neutral),
            ("crying", &self.prompts.crying),
            ("snapchat", &self.prompts.snapchat),
        ] {
            if prompt.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "prompts.{name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}
