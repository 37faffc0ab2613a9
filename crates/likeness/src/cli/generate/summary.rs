//! End-of-run summary table.

use likeness_core::RunReport;
use std::path::Path;
use std::time::Duration;

/// Print the summary table and failed items to stderr.
pub(crate) fn print_summary(report: &RunReport, output_dir: &Path, elapsed: Duration) {
    eprintln!();
    for line in format_summary(report, output_dir, elapsed) {
        eprintln!("{line}");
    }
}

fn format_summary(report: &RunReport, output_dir: &Path, elapsed: Duration) -> Vec<String> {
    let summary = &report.summary;
    let mut lines = vec![
        "  ====================================".to_string(),
        format!("               Summary: {}", report.influencer_id),
        "  ====================================".to_string(),
    ];

    for category in &summary.categories {
        let mut line = format!(
            "    {:<10} {:>2} ok",
            category.category.as_str(),
            category.succeeded
        );
        if category.failed > 0 {
            line.push_str(&format!(", {} failed", category.failed));
        }
        if category.pending > 0 {
            line.push_str(&format!(", {} pending", category.pending));
        }
        lines.push(line);
    }

    lines.push("  ------------------------------------".to_string());
    lines.push(format!("    Succeeded:    {:>8}", summary.succeeded));
    if summary.resumed > 0 {
        lines.push(format!("    Resumed:      {:>8}", summary.resumed));
    }
    if summary.failed > 0 {
        lines.push(format!("    Failed:       {:>8}", summary.failed));
    }
    if summary.pending > 0 {
        lines.push(format!("    Not run:      {:>8}", summary.pending));
    }
    lines.push(format!("    API calls:    {:>8}", summary.attempts));
    lines.push(format!("    Duration:     {:>7.1}s", elapsed.as_secs_f64()));
    lines.push(format!("    Output:       {}", output_dir.display()));
    lines.push("  ====================================".to_string());

    if !summary.failures.is_empty() {
        lines.push("  Failed:".to_string());
        for failure in &summary.failures {
            lines.push(format!(
                "    {}/{}  {}  {}",
                failure.category, failure.variant_index, failure.kind, failure.message
            ));
        }
    }
    if report.cancelled {
        lines.push("  Run interrupted; re-run to resume the remaining images.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use likeness_core::{FailureKind, WorkItem, WorkStatus};

    #[test]
    fn test_summary_lists_failures() {
        let mut items = WorkItem::enumerate("zed");
        for item in items.iter_mut() {
            item.status = WorkStatus::Succeeded;
            item.attempts = 1;
        }
        items[7].status = WorkStatus::Failed;
        items[7].failure = Some(FailureKind::RetriesExhausted);
        items[7].message = Some("Retries exhausted after 3 attempts".to_string());
        let report = RunReport::new("zed", items, false);

        let lines = format_summary(&report, Path::new("output/zed"), Duration::from_secs(2));
        let text = lines.join("\n");

        assert!(text.contains("Summary: zed"));
        assert!(text.contains("Crying      4 ok, 1 failed"));
        assert!(text.contains("Crying/3  RetriesExhausted  Retries exhausted after 3 attempts"));
        assert!(text.contains("output/zed"));
        assert!(!text.contains("interrupted"));
    }

    #[test]
    fn test_summary_notes_cancellation() {
        let report = RunReport::new("zed", WorkItem::enumerate("zed"), true);
        let text = format_summary(&report, Path::new("out"), Duration::ZERO).join("\n");
        assert!(text.contains("Not run:            15"));
        assert!(text.contains("interrupted"));
    }
}
