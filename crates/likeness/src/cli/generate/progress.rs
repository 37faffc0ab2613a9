//! Progress bar rendering for run events.

use indicatif::{ProgressBar, ProgressStyle};
use likeness_core::{ProgressEvent, WorkStatus};

pub(crate) fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message("starting...");
    pb
}

/// One-line description of a terminal event.
pub(crate) fn describe_event(event: &ProgressEvent) -> String {
    let key = event.key();
    match (event.status, event.failure) {
        (WorkStatus::Succeeded, _) if event.resumed => format!("{key} exists, skipped"),
        (WorkStatus::Succeeded, _) => format!("{key} done ({} attempt(s))", event.attempt_count),
        (_, Some(kind)) => format!("{key} failed: {kind} ({} attempt(s))", event.attempt_count),
        (status, None) => format!("{key} {status:?}"),
    }
}
