//! Configuration management for Likeness.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`; missing sections and
//! keys fall back to those defaults.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Likeness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Retry, concurrency and resume settings
    pub generation: GenerationConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Image API settings
    pub gemini: GeminiConfig,

    /// Output file settings
    pub output: OutputConfig,

    /// Category prompts
    pub prompts: PromptConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.likeness.likeness/config.toml
    /// - Linux: ~/.config/likeness/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\likeness\config\config.toml
    ///
    /// Falls back to ~/.likeness/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "likeness", "likeness")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".likeness").join("config.toml")
            })
    }

    /// Get the resolved output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        let path_str = self.general.output_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.generation.concurrency, 1);
        assert!(config.generation.resume);
        assert_eq!(config.limits.request_timeout_ms, 60_000);
        assert_eq!(config.output.extension, "png");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[generation]"));
        assert!(toml.contains("[prompts]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [generation]
            concurrency = 2

            [prompts]
            crying = "sobbing, mascara running"
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.concurrency, 2);
        assert_eq!(config.generation.max_attempts, 3);
        assert_eq!(config.prompts.crying, "sobbing, mascara running");
        assert_eq!(config.prompts.neutral, PromptConfig::default().neutral);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[generation]\nmax_attempts = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_output_dir_expands_tilde() {
        let mut config = Config::default();
        config.general.output_dir = PathBuf::from("~/likeness-out");
        let resolved = config.output_dir();
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }
}
