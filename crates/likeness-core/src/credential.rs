//! API key resolution.
//!
//! The generator only ever sees a validated [`ApiKey`]; resolving one fails
//! with `MissingCredential` before any network call is attempted.

use crate::error::LikenessError;

/// Environment variables consulted when the config holds no usable key.
pub const FALLBACK_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"];

/// A non-empty API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validate a raw key. Blank keys are rejected.
    pub fn new(raw: &str) -> Result<Self, LikenessError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LikenessError::MissingCredential(
                "API key is empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([redacted])")
    }
}

/// Source of the API key.
pub trait CredentialProvider {
    fn get_api_key(&self) -> Result<ApiKey, LikenessError>;
}

/// A key supplied directly (CLI flag, tests).
pub struct StaticCredential(pub String);

impl CredentialProvider for StaticCredential {
    fn get_api_key(&self) -> Result<ApiKey, LikenessError> {
        ApiKey::new(&self.0)
    }
}

/// Key from the config value (with `${VAR}` expansion), then the fallback
/// environment variables.
pub struct EnvCredentials {
    configured: String,
}

impl EnvCredentials {
    pub fn new(configured: &str) -> Self {
        Self {
            configured: configured.to_string(),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn get_api_key(&self) -> Result<ApiKey, LikenessError> {
        let found = resolve_env_var(&self.configured)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                FALLBACK_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|v| !v.trim().is_empty())
            });

        match found {
            Some(key) => ApiKey::new(&key),
            None => Err(LikenessError::MissingCredential(format!(
                "no API key configured. Set {} (or {}) or gemini.api_key in the config file.",
                FALLBACK_ENV_VARS[0], FALLBACK_ENV_VARS[1]
            ))),
        }
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_is_missing_credential() {
        let err = StaticCredential(String::new()).get_api_key().unwrap_err();
        assert!(matches!(err, LikenessError::MissingCredential(_)));

        let err = StaticCredential("   ".into()).get_api_key().unwrap_err();
        assert!(matches!(err, LikenessError::MissingCredential(_)));
    }

    #[test]
    fn test_static_key_is_trimmed() {
        let key = StaticCredential(" abc123 \n".into()).get_api_key().unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = ApiKey::new("super-secret").unwrap();
        let shown = format!("{key:?}");
        assert!(!shown.contains("super-secret"));
    }

    #[test]
    fn test_literal_config_value_wins() {
        let key = EnvCredentials::new("literal-key").get_api_key().unwrap();
        assert_eq!(key.expose(), "literal-key");
    }

    #[test]
    fn test_resolve_env_var() {
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        assert_eq!(resolve_env_var(""), None);
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_LIKENESS_42}"), None);
    }
}
