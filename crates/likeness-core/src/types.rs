//! Core data types for a generation run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::FailureKind;

/// Number of variants generated per category.
pub const VARIANTS_PER_CATEGORY: u8 = 5;

/// Expression category of a generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Neutral,
    Crying,
    Snapchat,
}

impl Category {
    /// All categories in processing order.
    pub const ALL: [Category; 3] = [Category::Neutral, Category::Crying, Category::Snapchat];

    /// Directory name used in the output tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Neutral => "Neutral",
            Category::Crying => "Crying",
            Category::Snapchat => "Snapchat",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkStatus {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl WorkStatus {
    /// Whether the item has reached its final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkStatus::Succeeded | WorkStatus::Failed)
    }
}

/// Identifies one work item within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkKey {
    pub category: Category,
    pub variant_index: u8,
}

impl std::fmt::Display for WorkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.variant_index)
    }
}

/// One unit of generation work and its current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub influencer_id: String,
    pub category: Category,
    /// 1-based, unique within the category
    pub variant_index: u8,
    pub status: WorkStatus,

    /// API attempts spent on this item
    pub attempts: u32,

    /// Satisfied by an output file from an earlier run
    #[serde(default)]
    pub resumed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl WorkItem {
    /// A fresh pending item.
    pub fn new(influencer_id: &str, category: Category, variant_index: u8) -> Self {
        Self {
            influencer_id: influencer_id.to_string(),
            category,
            variant_index,
            status: WorkStatus::Pending,
            attempts: 0,
            resumed: false,
            failure: None,
            message: None,
            output_path: None,
        }
    }

    pub fn key(&self) -> WorkKey {
        WorkKey {
            category: self.category,
            variant_index: self.variant_index,
        }
    }

    /// Enumerate the full set of work items for one influencer.
    ///
    /// Order is fixed: Neutral 1-5, Crying 1-5, Snapchat 1-5.
    pub fn enumerate(influencer_id: &str) -> Vec<WorkItem> {
        Category::ALL
            .iter()
            .flat_map(|&category| {
                (1..=VARIANTS_PER_CATEGORY)
                    .map(move |variant_index| WorkItem::new(influencer_id, category, variant_index))
            })
            .collect()
    }
}
