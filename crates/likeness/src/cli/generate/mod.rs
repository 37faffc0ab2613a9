//! The `likeness generate` command.

mod progress;
mod setup;
mod summary;

use clap::Args;
use likeness_core::{Config, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use progress::{create_progress_bar, describe_event};
use setup::setup_runner;
use summary::print_summary;

/// Exit status when the run was interrupted.
const EXIT_INTERRUPTED: u8 = 130;

/// Arguments for the `generate` command.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Base image (<influencer>_baseimage.<ext>) or a directory containing one
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output root directory (overrides general.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum work items in flight
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Regenerate images even if their output file exists
    #[arg(long)]
    pub no_resume: bool,

    /// Attempts per image, first try included
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Delay between API dispatches in milliseconds
    #[arg(long)]
    pub pace_ms: Option<u64>,

    /// API key for this run (otherwise from config or GEMINI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Image model name
    #[arg(long)]
    pub model: Option<String>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the generate command.
///
/// Exits 0 only when all fifteen images exist at the end of the run.
pub async fn execute(args: GenerateArgs, config: Config) -> anyhow::Result<ExitCode> {
    let ctx = setup_runner(&args, config)?;
    let base = Arc::new(ctx.base);
    let influencer_id = base.influencer_id.clone();

    tracing::info!(
        "Base image {} -> {}",
        base.path.display(),
        ctx.runner.writer().influencer_dir(&influencer_id).display()
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing in-flight images");
            interrupt.cancel();
        }
    });

    let start = Instant::now();
    let bar = create_progress_bar(likeness_core::WorkItem::enumerate(&influencer_id).len() as u64);
    let report = ctx
        .runner
        .run(base, cancel, |event| {
            bar.inc(1);
            let line = describe_event(event);
            if event.failure.is_some() {
                bar.println(line);
            } else {
                bar.set_message(line);
            }
        })
        .await;
    bar.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    print_summary(
        &report,
        &ctx.runner.writer().influencer_dir(&influencer_id),
        start.elapsed(),
    );

    Ok(ExitCode::from(exit_status(&report)))
}

/// Process exit status for a finished run.
fn exit_status(report: &RunReport) -> u8 {
    if report.is_success() {
        0
    } else if report.cancelled {
        EXIT_INTERRUPTED
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likeness_core::{FailureKind, WorkItem, WorkStatus};

    fn report(settle: impl Fn(&mut WorkItem), cancelled: bool) -> RunReport {
        let mut items = WorkItem::enumerate("zed");
        for item in &mut items {
            item.status = WorkStatus::Succeeded;
            item.attempts = 1;
        }
        settle(&mut items[7]);
        RunReport::new("zed", items, cancelled)
    }

    #[test]
    fn test_exit_status_all_succeeded() {
        assert_eq!(exit_status(&report(|_| {}, false)), 0);
    }

    #[test]
    fn test_exit_status_any_failure() {
        let failed = report(
            |item| {
                item.status = WorkStatus::Failed;
                item.failure = Some(FailureKind::InvalidResponse);
            },
            false,
        );
        assert_eq!(exit_status(&failed), 1);
    }

    #[test]
    fn test_exit_status_interrupted() {
        let interrupted = report(|item| item.status = WorkStatus::Pending, true);
        assert_eq!(exit_status(&interrupted), EXIT_INTERRUPTED);

        // Failures take the interrupt code too once the run was cut short.
        let failed_then_interrupted = report(|item| item.status = WorkStatus::Failed, true);
        assert_eq!(exit_status(&failed_then_interrupted), 130);
    }
}
