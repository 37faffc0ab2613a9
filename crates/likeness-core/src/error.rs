//! Error types for the Likeness generation pipeline.
//!
//! Run-level errors ([`LikenessError`]) abort a batch before any API call is
//! made. Item-level errors ([`GenerationError`]) are isolated to a single work
//! item and recorded in the run report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for Likeness operations.
#[derive(Error, Debug)]
pub enum LikenessError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The base image or influencer identifier is unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No usable API key was found
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LikenessError {
    /// Failure kind for run-level errors that map onto the item taxonomy.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            LikenessError::InvalidInput(_) => Some(FailureKind::InvalidInput),
            LikenessError::MissingCredential(_) => Some(FailureKind::MissingCredential),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Serializable failure taxonomy shared by events, summaries and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    InvalidInput,
    MissingCredential,
    AuthFailure,
    RateLimited,
    TransientFailure,
    InvalidResponse,
    RetriesExhausted,
    FilesystemError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::InvalidInput => "InvalidInput",
            FailureKind::MissingCredential => "MissingCredential",
            FailureKind::AuthFailure => "AuthFailure",
            FailureKind::RateLimited => "RateLimited",
            FailureKind::TransientFailure => "TransientFailure",
            FailureKind::InvalidResponse => "InvalidResponse",
            FailureKind::RetriesExhausted => "RetriesExhausted",
            FailureKind::FilesystemError => "FilesystemError",
        };
        f.write_str(name)
    }
}

/// Failure of a single generation attempt or work item.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The service rejected the credential (401/403)
    #[error("Authentication rejected: {0}")]
    Auth(String),

    /// Quota or backpressure signal from the service (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network failure, timeout or 5xx-class error
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The response could not be turned into image bytes
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Every allowed attempt failed with a retryable error
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },

    /// The request could not be built for this item
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Writing the output file failed
    #[error("Filesystem error: {0}")]
    Filesystem(String),
}

impl GenerationError {
    /// Map onto the serializable taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::Auth(_) => FailureKind::AuthFailure,
            GenerationError::RateLimited(_) => FailureKind::RateLimited,
            GenerationError::Transient(_) => FailureKind::TransientFailure,
            GenerationError::InvalidResponse(_) => FailureKind::InvalidResponse,
            GenerationError::RetriesExhausted { .. } => FailureKind::RetriesExhausted,
            GenerationError::InvalidInput(_) => FailureKind::InvalidInput,
            GenerationError::Filesystem(_) => FailureKind::FilesystemError,
        }
    }

    /// The failure that ended the last attempt, looking through `RetriesExhausted`.
    pub fn last_cause(&self) -> &GenerationError {
        match self {
            GenerationError::RetriesExhausted { last, .. } => last.last_cause(),
            other => other,
        }
    }

    /// Whether the credential was rejected, directly or as the last retry cause.
    pub fn is_auth(&self) -> bool {
        matches!(self.last_cause(), GenerationError::Auth(_))
    }
}

/// Convenience type alias for Likeness results.
pub type Result<T> = std::result::Result<T, LikenessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_kind_and_cause() {
        let err = GenerationError::RetriesExhausted {
            attempts: 3,
            last: Box::new(GenerationError::RateLimited("HTTP 429".into())),
        };
        assert_eq!(err.kind(), FailureKind::RetriesExhausted);
        assert_eq!(err.last_cause().kind(), FailureKind::RateLimited);
        assert!(err.to_string().contains("3 attempts"));
        assert!(!err.is_auth());
    }

    #[test]
    fn test_run_level_kinds() {
        assert_eq!(
            LikenessError::MissingCredential("unset".into()).kind(),
            Some(FailureKind::MissingCredential)
        );
        assert_eq!(
            LikenessError::InvalidInput("empty".into()).kind(),
            Some(FailureKind::InvalidInput)
        );
    }

    #[test]
    fn test_failure_kind_serializes_as_name() {
        let json = serde_json::to_string(&FailureKind::TransientFailure).unwrap();
        assert_eq!(json, "\"TransientFailure\"");
    }
}
