//! Likeness CLI - Batch likeness generation from a single base portrait.
//!
//! Likeness takes one `<influencer>_baseimage.<ext>` file and produces
//! fifteen variations (Neutral, Crying and Snapchat, five each) through the
//! Gemini image API, writing them to a deterministic output tree.
//!
//! # Usage
//!
//! ```bash
//! # Generate every variant for one influencer
//! likeness generate input/zed_baseimage.png
//!
//! # Preview what would be generated or resumed
//! likeness plan input/ --output renders/
//!
//! # View configuration
//! likeness config show
//! ```

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod cli;
mod logging;

/// Likeness - Batch likeness generation from a single base portrait.
#[derive(Parser, Debug)]
#[command(name = "likeness")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate all fifteen variants for a base image
    Generate(cli::generate::GenerateArgs),

    /// Show the work items and target paths without calling the API
    Plan(cli::plan::PlanArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Pick up GEMINI_API_KEY and friends from a local .env, if present
    dotenvy::dotenv().ok();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match likeness_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `likeness config path`."
            );
            likeness_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Likeness v{}", likeness_core::VERSION);

    match cli.command {
        Commands::Generate(args) => cli::generate::execute(args, config).await,
        Commands::Plan(args) => cli::plan::execute(args, config).map(|()| ExitCode::SUCCESS),
        Commands::Config(args) => cli::config::execute(args).map(|()| ExitCode::SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "likeness",
            "--verbose",
            "generate",
            "zed_baseimage.png",
            "--output",
            "renders",
            "--concurrency",
            "2",
            "--no-resume",
            "--max-attempts",
            "5",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.input, std::path::PathBuf::from("zed_baseimage.png"));
                assert_eq!(args.output, Some("renders".into()));
                assert_eq!(args.concurrency, Some(2));
                assert!(args.no_resume);
                assert_eq!(args.max_attempts, Some(5));
                assert!(args.api_key.is_none());
            }
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_requires_input() {
        assert!(Cli::try_parse_from(["likeness", "generate"]).is_err());
    }

    #[test]
    fn test_config_init_force() {
        let cli = Cli::try_parse_from(["likeness", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(cli::config::ConfigArgs {
                command: cli::config::ConfigCommand::Init { force: true }
            })
        ));
    }
}
