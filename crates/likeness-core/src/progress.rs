//! Run progress tracking, progress events and the final report.
//!
//! [`RunProgress`] is owned by the orchestrator's coordinating task; workers
//! never touch it. Every terminal transition produces exactly one
//! [`ProgressEvent`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FailureKind, GenerationError};
use crate::types::{Category, WorkItem, WorkKey, WorkStatus, VARIANTS_PER_CATEGORY};

/// Emitted once per work item when it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub category: Category,
    pub variant_index: u8,
    pub status: WorkStatus,
    pub attempt_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub resumed: bool,
}

impl ProgressEvent {
    fn from_item(item: &WorkItem) -> Self {
        Self {
            category: item.category,
            variant_index: item.variant_index,
            status: item.status,
            attempt_count: item.attempts,
            failure: item.failure,
            output_path: item.output_path.clone(),
            resumed: item.resumed,
        }
    }

    pub fn key(&self) -> WorkKey {
        WorkKey {
            category: self.category,
            variant_index: self.variant_index,
        }
    }
}

/// Per-item state for one run.
#[derive(Debug, Clone)]
pub struct RunProgress {
    influencer_id: String,
    items: Vec<WorkItem>,
}

impl RunProgress {
    pub fn new(influencer_id: &str) -> Self {
        Self {
            influencer_id: influencer_id.to_string(),
            items: WorkItem::enumerate(influencer_id),
        }
    }

    pub fn influencer_id(&self) -> &str {
        &self.influencer_id
    }

    /// Items in processing order.
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn get(&self, key: WorkKey) -> Option<&WorkItem> {
        self.index_of(key).map(|i| &self.items[i])
    }

    fn index_of(&self, key: WorkKey) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }

    fn transition(
        &mut self,
        key: WorkKey,
        update: impl FnOnce(&mut WorkItem),
    ) -> Option<ProgressEvent> {
        let idx = self.index_of(key)?;
        let item = &mut self.items[idx];
        if item.status.is_terminal() {
            tracing::warn!("Ignoring second terminal transition for {key}");
            return None;
        }
        update(item);
        Some(ProgressEvent::from_item(item))
    }

    /// Mark an item as dispatched to a worker.
    pub fn mark_in_flight(&mut self, key: WorkKey) {
        if let Some(idx) = self.index_of(key) {
            let item = &mut self.items[idx];
            if item.status == WorkStatus::Pending {
                item.status = WorkStatus::InFlight;
            }
        }
    }

    /// Record success. Returns the event, or `None` if the item was already terminal.
    pub fn mark_succeeded(
        &mut self,
        key: WorkKey,
        attempts: u32,
        output_path: PathBuf,
        resumed: bool,
    ) -> Option<ProgressEvent> {
        self.transition(key, |item| {
            item.status = WorkStatus::Succeeded;
            item.attempts = attempts;
            item.output_path = Some(output_path);
            item.resumed = resumed;
            item.failure = None;
            item.message = None;
        })
    }

    /// Record failure. Returns the event, or `None` if the item was already terminal.
    pub fn mark_failed(
        &mut self,
        key: WorkKey,
        attempts: u32,
        error: &GenerationError,
    ) -> Option<ProgressEvent> {
        self.transition(key, |item| {
            item.status = WorkStatus::Failed;
            item.attempts = attempts;
            item.failure = Some(error.kind());
            item.message = Some(error.to_string());
        })
    }

    /// Whether every item has reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|i| i.status.is_terminal())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_items(&self.items)
    }

    /// Freeze into a report.
    pub fn into_report(self, cancelled: bool) -> RunReport {
        RunReport::new(&self.influencer_id, self.items, cancelled)
    }
}

/// Counts for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub succeeded: usize,
    pub failed: usize,
    /// Never reached a terminal status (run cancelled)
    pub pending: usize,
}

/// A failed work item as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub category: Category,
    pub variant_index: u8,
    pub kind: FailureKind,
    pub message: String,
}

/// Aggregated outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub categories: Vec<CategorySummary>,
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
    /// Succeeded items satisfied by existing files
    pub resumed: usize,
    /// API attempts spent across all items
    pub attempts: u32,
    pub failures: Vec<FailedItem>,
}

impl RunSummary {
    pub fn from_items(items: &[WorkItem]) -> Self {
        let categories = Category::ALL
            .iter()
            .map(|&category| {
                let in_category = items.iter().filter(|i| i.category == category);
                let mut summary = CategorySummary {
                    category,
                    succeeded: 0,
                    failed: 0,
                    pending: 0,
                };
                for item in in_category {
                    match item.status {
                        WorkStatus::Succeeded => summary.succeeded += 1,
                        WorkStatus::Failed => summary.failed += 1,
                        WorkStatus::Pending | WorkStatus::InFlight => summary.pending += 1,
                    }
                }
                summary
            })
            .collect::<Vec<_>>();

        let failures = items
            .iter()
            .filter(|i| i.status == WorkStatus::Failed)
            .map(|i| FailedItem {
                category: i.category,
                variant_index: i.variant_index,
                kind: i.failure.unwrap_or(FailureKind::TransientFailure),
                message: i.message.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            succeeded: categories.iter().map(|c| c.succeeded).sum(),
            failed: categories.iter().map(|c| c.failed).sum(),
            pending: categories.iter().map(|c| c.pending).sum(),
            resumed: items
                .iter()
                .filter(|i| i.status == WorkStatus::Succeeded && i.resumed)
                .count(),
            attempts: items.iter().map(|i| i.attempts).sum(),
            categories,
            failures,
        }
    }

    /// True when every work item succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0
            && self.pending == 0
            && self.succeeded == Category::ALL.len() * VARIANTS_PER_CATEGORY as usize
    }
}

/// Final record of a run, persisted as `run.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub influencer_id: String,
    /// Stopped by external cancellation before every item was dispatched
    pub cancelled: bool,
    pub summary: RunSummary,
    pub items: Vec<WorkItem>,
}

impl RunReport {
    pub fn new(influencer_id: &str, items: Vec<WorkItem>, cancelled: bool) -> Self {
        Self {
            influencer_id: influencer_id.to_string(),
            cancelled,
            summary: RunSummary::from_items(&items),
            items,
        }
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.summary.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category: Category, variant_index: u8) -> WorkKey {
        WorkKey {
            category,
            variant_index,
        }
    }

    #[test]
    fn test_success_event_carries_attempts() {
        let mut progress = RunProgress::new("zed");
        let k = key(Category::Crying, 3);
        progress.mark_in_flight(k);
        assert_eq!(progress.get(k).unwrap().status, WorkStatus::InFlight);

        let event = progress
            .mark_succeeded(k, 3, PathBuf::from("output/zed/Crying/3.png"), false)
            .unwrap();
        assert_eq!(event.status, WorkStatus::Succeeded);
        assert_eq!(event.attempt_count, 3);
        assert_eq!(event.key(), k);
    }

    #[test]
    fn test_second_terminal_transition_is_ignored() {
        let mut progress = RunProgress::new("zed");
        let k = key(Category::Neutral, 1);
        let err = GenerationError::Auth("HTTP 401".into());
        assert!(progress.mark_failed(k, 1, &err).is_some());
        assert!(progress
            .mark_succeeded(k, 2, PathBuf::from("x.png"), false)
            .is_none());
        assert_eq!(progress.get(k).unwrap().status, WorkStatus::Failed);
    }

    #[test]
    fn test_summary_counts_and_failures() {
        let mut progress = RunProgress::new("zed");
        for item in WorkItem::enumerate("zed") {
            let k = item.key();
            if k == key(Category::Snapchat, 2) {
                progress.mark_failed(k, 1, &GenerationError::InvalidResponse("no image".into()));
            } else if k.category != Category::Crying {
                progress.mark_succeeded(k, 1, PathBuf::from("p.png"), k.variant_index == 1);
            }
        }

        let summary = progress.summary();
        assert_eq!(summary.succeeded, 9);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 5);
        assert_eq!(summary.resumed, 2);
        assert!(!summary.is_success());
        assert!(!progress.is_complete());

        let crying = summary
            .categories
            .iter()
            .find(|c| c.category == Category::Crying)
            .unwrap();
        assert_eq!(crying.pending, 5);

        assert_eq!(
            summary.failures,
            vec![FailedItem {
                category: Category::Snapchat,
                variant_index: 2,
                kind: FailureKind::InvalidResponse,
                message: "Invalid response: no image".to_string(),
            }]
        );
    }

    #[test]
    fn test_all_succeeded_is_success() {
        let mut progress = RunProgress::new("zed");
        for item in WorkItem::enumerate("zed") {
            progress.mark_succeeded(item.key(), 1, PathBuf::from("p.png"), false);
        }
        assert!(progress.is_complete());
        let report = progress.into_report(false);
        assert!(report.is_success());
        assert_eq!(report.summary.succeeded, 15);
        assert_eq!(report.summary.attempts, 15);
    }
}
