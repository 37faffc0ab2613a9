//! Likeness Core - Batch likeness generation library.
//!
//! Takes one base portrait of an influencer and produces fifteen variations
//! (five each of Neutral, Crying and Snapchat) through an external image
//! generation API, with bounded retry, resume and atomic output.
//!
//! # Architecture
//!
//! ```text
//! BaseImage → 15 WorkItems → Request → Generator (retry) → OutputWriter → RunReport
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use likeness_core::{BaseImage, BatchRunner, Config, EnvCredentials, GeneratorFactory};
//! use likeness_core::credential::CredentialProvider;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> likeness_core::Result<()> {
//!     let config = Config::load()?;
//!     let base = BaseImage::load("zed_baseimage.png".as_ref(), &config.limits)?;
//!     let key = EnvCredentials::new(&config.gemini.api_key).get_api_key()?;
//!
//!     let generator = GeneratorFactory::create(&config, key, None);
//!     let runner = BatchRunner::from_config(&config, generator);
//!     let report = runner
//!         .run(Arc::new(base), CancellationToken::new(), |event| println!("{event:?}"))
//!         .await;
//!     println!("{} succeeded", report.summary.succeeded);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod batch;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;
pub mod request;
pub mod retry;
pub mod types;

// Re-exports for convenient access
pub use batch::{plan, BatchOptions, BatchRunner, PlannedItem};
pub use client::{GeneratedImage, GeneratorFactory, ImageGenerator};
pub use config::Config;
pub use credential::{ApiKey, EnvCredentials};
pub use error::{ConfigError, FailureKind, GenerationError, LikenessError, Result};
pub use input::BaseImage;
pub use output::OutputWriter;
pub use progress::{ProgressEvent, RunReport, RunSummary};
pub use request::{GenerationRequest, PromptTable};
pub use retry::RetryPolicy;
pub use types::{Category, WorkItem, WorkKey, WorkStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
