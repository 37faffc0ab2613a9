//! Run setup: config overrides, input validation, credentials, generator.
//!
//! Everything here fails before the first API call.

use likeness_core::credential::{CredentialProvider, EnvCredentials, StaticCredential};
use likeness_core::{BaseImage, BatchRunner, Config, GeneratorFactory};

use super::GenerateArgs;

/// Everything needed to start a run.
pub(crate) struct GenerateContext {
    pub runner: BatchRunner,
    pub base: BaseImage,
}

/// Check the input path exists and assemble the run.
pub fn setup_runner(args: &GenerateArgs, config: Config) -> anyhow::Result<GenerateContext> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Pass a <influencer>_baseimage file or its directory.",
            args.input
        );
    }
    prepare(args, config)
}

/// Apply CLI overrides to `config`, then validate input and credentials.
pub(crate) fn prepare(args: &GenerateArgs, mut config: Config) -> anyhow::Result<GenerateContext> {
    apply_overrides(args, &mut config);
    config.validate()?;

    let base = BaseImage::load(&args.input, &config.limits)?;
    tracing::debug!(
        "Loaded base image for {} ({}, {} bytes)",
        base.influencer_id,
        base.mime_type,
        base.bytes.len()
    );

    let api_key = match &args.api_key {
        Some(key) => StaticCredential(key.clone()).get_api_key()?,
        None => EnvCredentials::new(&config.gemini.api_key).get_api_key()?,
    };

    let generator = GeneratorFactory::create(&config, api_key, args.model.as_deref());
    let runner = BatchRunner::from_config(&config, generator);
    Ok(GenerateContext { runner, base })
}

fn apply_overrides(args: &GenerateArgs, config: &mut Config) {
    if let Some(output) = &args.output {
        config.general.output_dir = output.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.generation.concurrency = concurrency;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.generation.max_attempts = max_attempts;
    }
    if let Some(pace_ms) = args.pace_ms {
        config.generation.pace_ms = pace_ms;
    }
    if args.no_resume {
        config.generation.resume = false;
    }
}
