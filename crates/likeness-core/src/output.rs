//! Deterministic output tree and atomic file writes.
//!
//! Layout: `<root>/<influencer>/<Category>/<variant>.<ext>`, plus a
//! `run.json` report per influencer. Every write goes to a temporary file in
//! the destination directory and is renamed into place, so readers never see
//! a partial image and re-writes are last-write-wins.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{GenerationError, LikenessError};
use crate::progress::RunReport;
use crate::types::Category;

/// File name of the per-influencer run report.
pub const REPORT_FILE: &str = "run.json";

/// Writes generated images into the output tree.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
    extension: String,
}

impl OutputWriter {
    /// Create a writer rooted at `root`, naming files `<n>.<extension>`.
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir(), &config.output.extension)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every output of one influencer.
    pub fn influencer_dir(&self, influencer_id: &str) -> PathBuf {
        self.root.join(influencer_id)
    }

    /// Deterministic path of one generated image.
    pub fn path_for(&self, influencer_id: &str, category: Category, variant_index: u8) -> PathBuf {
        self.influencer_dir(influencer_id)
            .join(category.as_str())
            .join(format!("{variant_index}.{}", self.extension))
    }

    /// Whether the image for this work item is already on disk.
    pub fn exists(&self, influencer_id: &str, category: Category, variant_index: u8) -> bool {
        self.path_for(influencer_id, category, variant_index).is_file()
    }

    /// Atomically write one generated image, returning its path.
    pub fn write(
        &self,
        influencer_id: &str,
        category: Category,
        variant_index: u8,
        bytes: &[u8],
    ) -> Result<PathBuf, GenerationError> {
        let path = self.path_for(influencer_id, category, variant_index);
        write_atomic(&path, bytes).map_err(|e| {
            GenerationError::Filesystem(format!("failed to write {}: {e}", path.display()))
        })?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Path of the run report for an influencer.
    pub fn report_path(&self, influencer_id: &str) -> PathBuf {
        self.influencer_dir(influencer_id).join(REPORT_FILE)
    }

    /// Atomically persist the run report next to the category directories.
    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf, LikenessError> {
        let path = self.report_path(&report.influencer_id);
        let json = serde_json::to_vec_pretty(report)?;
        write_atomic(&path, &json)?;
        Ok(path)
    }
}

/// Write `bytes` to a temp file beside `path`, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other(format!("{} has no parent", path.display())))?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".likeness-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_path_layout() {
        let writer = OutputWriter::new("output", "png");
        assert_eq!(
            writer.path_for("zed", Category::Crying, 3),
            PathBuf::from("output/zed/Crying/3.png")
        );
        assert_eq!(writer.report_path("zed"), PathBuf::from("output/zed/run.json"));
    }

    #[test]
    fn test_extension_leading_dot_is_ignored() {
        let writer = OutputWriter::new("out", ".jpg");
        assert_eq!(
            writer.path_for("amy", Category::Neutral, 1),
            PathBuf::from("out/amy/Neutral/1.jpg")
        );
    }

    #[test]
    fn test_write_creates_parents_and_reports_existence() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), "png");
        assert!(!writer.exists("zed", Category::Snapchat, 5));

        let path = writer.write("zed", Category::Snapchat, 5, b"first").unwrap();
        assert_eq!(path, dir.path().join("zed/Snapchat/5.png"));
        assert!(writer.exists("zed", Category::Snapchat, 5));
    }

    #[test]
    fn test_write_is_idempotent_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), "png");

        writer.write("zed", Category::Neutral, 2, b"old bytes").unwrap();
        let path = writer.write("zed", Category::Neutral, 2, b"new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        // Exactly one file, no leftover temp artifacts
        assert_eq!(entries(&dir.path().join("zed/Neutral")), vec!["2.png"]);
    }

    #[test]
    fn test_write_failure_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the influencer directory should go
        std::fs::write(dir.path().join("zed"), b"in the way").unwrap();
        let writer = OutputWriter::new(dir.path(), "png");

        let err = writer.write("zed", Category::Neutral, 1, b"x").unwrap_err();
        assert!(matches!(err, GenerationError::Filesystem(_)));
    }

    #[test]
    fn test_write_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), "png");
        let report = RunReport::new("zed", crate::types::WorkItem::enumerate("zed"), false);

        let path = writer.write_report(&report).unwrap();
        let loaded: RunReport = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(loaded.influencer_id, "zed");
        assert_eq!(loaded.items.len(), 15);
        assert_eq!(entries(&dir.path().join("zed")), vec!["run.json"]);
    }
}
