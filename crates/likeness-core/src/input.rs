//! Base image discovery and loading.
//!
//! The base image's file name carries the influencer identifier:
//! `<influencer>_baseimage.<ext>`.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::LimitsConfig;
use crate::error::{LikenessError, Result};

/// File-name suffix (before the extension) that marks a base image.
pub const BASE_IMAGE_SUFFIX: &str = "_baseimage";

/// Accepted base image extensions.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "bmp"];

/// A validated base image held in memory.
#[derive(Debug, Clone)]
pub struct BaseImage {
    pub path: PathBuf,
    pub influencer_id: String,
    pub bytes: Vec<u8>,
    /// MIME type sniffed from the content (e.g. "image/png")
    pub mime_type: String,
}

impl BaseImage {
    /// Load a base image from a file, or discover one inside a directory.
    pub fn load(path: &Path, limits: &LimitsConfig) -> Result<Self> {
        let file = if path.is_dir() {
            discover(path)?
        } else {
            path.to_path_buf()
        };

        if !file.is_file() {
            return Err(LikenessError::InvalidInput(format!(
                "base image not found: {}",
                file.display()
            )));
        }
        if !has_supported_extension(&file) {
            return Err(LikenessError::InvalidInput(format!(
                "unsupported base image extension: {} (expected one of {})",
                file.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let influencer_id = parse_influencer_id(&file)?;

        let size = std::fs::metadata(&file)?.len();
        let max_bytes = limits.max_input_size_mb * 1024 * 1024;
        if size > max_bytes {
            return Err(LikenessError::InvalidInput(format!(
                "base image too large: {} ({}MB > {}MB)",
                file.display(),
                size / (1024 * 1024),
                limits.max_input_size_mb
            )));
        }

        let bytes = std::fs::read(&file)?;
        Self::from_bytes(file, influencer_id, bytes)
    }

    /// Wrap already-loaded bytes, checking they look like an image.
    pub fn from_bytes(path: PathBuf, influencer_id: String, bytes: Vec<u8>) -> Result<Self> {
        if influencer_id.trim().is_empty() {
            return Err(LikenessError::InvalidInput(
                "influencer identifier is empty".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(LikenessError::InvalidInput(format!(
                "base image is empty: {}",
                path.display()
            )));
        }
        let format = image::guess_format(&bytes).map_err(|e| {
            LikenessError::InvalidInput(format!(
                "base image is not a recognized image format: {} ({e})",
                path.display()
            ))
        })?;

        Ok(Self {
            path,
            influencer_id,
            bytes,
            mime_type: format.to_mime_type().to_string(),
        })
    }
}

/// Extract the influencer identifier from `<influencer>_baseimage.<ext>`.
pub fn parse_influencer_id(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            LikenessError::InvalidInput(format!("unreadable file name: {}", path.display()))
        })?;

    let split = stem.len().checked_sub(BASE_IMAGE_SUFFIX.len());
    let id = match split.and_then(|at| Some((stem.get(..at)?, stem.get(at..)?))) {
        Some((id, suffix)) if suffix.eq_ignore_ascii_case(BASE_IMAGE_SUFFIX) => id.trim(),
        _ => {
            return Err(LikenessError::InvalidInput(format!(
                "file name must look like <influencer>{BASE_IMAGE_SUFFIX}.<ext>, got {stem:?}"
            )))
        }
    };
    if id.is_empty() {
        return Err(LikenessError::InvalidInput(format!(
            "no influencer identifier before {BASE_IMAGE_SUFFIX} in {stem:?}"
        )));
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(LikenessError::InvalidInput(format!(
            "influencer identifier {id:?} is not a valid directory name"
        )));
    }
    Ok(id.to_string())
}

/// Find the base image in a directory (non-recursive).
///
/// Candidates are sorted by path; the first one wins.
pub fn discover(dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && has_supported_extension(p) && parse_influencer_id(p).is_ok())
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(LikenessError::InvalidInput(format!(
            "no *{BASE_IMAGE_SUFFIX} image found in {}",
            dir.display()
        ))),
        1 => Ok(candidates.remove(0)),
        n => {
            tracing::warn!(
                "Found {n} base images in {}, using {}",
                dir.display(),
                candidates[0].display()
            );
            Ok(candidates.remove(0))
        }
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|s| *s == ext_lower)
        })
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal bytes that sniff as PNG.
    pub(crate) const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_parse_influencer_id() {
        assert_eq!(
            parse_influencer_id(Path::new("in/zed_baseimage.png")).unwrap(),
            "zed"
        );
        assert_eq!(
            parse_influencer_id(Path::new("Mia-02_BaseImage.JPG")).unwrap(),
            "Mia-02"
        );
    }

    #[test]
    fn test_parse_influencer_id_rejects_bad_names() {
        assert!(parse_influencer_id(Path::new("zed.png")).is_err());
        assert!(parse_influencer_id(Path::new("_baseimage.png")).is_err());
        assert!(parse_influencer_id(Path::new("..")).is_err());
    }

    #[test]
    fn test_load_valid_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zed_baseimage.png");
        std::fs::write(&path, PNG_BYTES).unwrap();

        let base = BaseImage::load(&path, &LimitsConfig::default()).unwrap();
        assert_eq!(base.influencer_id, "zed");
        assert_eq!(base.mime_type, "image/png");
        assert_eq!(base.bytes, PNG_BYTES);
    }

    #[test]
    fn test_load_rejects_non_image_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zed_baseimage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = BaseImage::load(&path, &LimitsConfig::default()).unwrap_err();
        assert!(matches!(err, LikenessError::InvalidInput(_)));
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zed_baseimage.png");
        std::fs::write(&path, b"").unwrap();

        let err = BaseImage::load(&path, &LimitsConfig::default()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_load_rejects_missing_file() {
        let err = BaseImage::load(
            Path::new("/nonexistent/zed_baseimage.png"),
            &LimitsConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LikenessError::InvalidInput(_)));
    }

    #[test]
    fn test_discover_picks_first_sorted_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
        std::fs::write(dir.path().join("zed_baseimage.png"), PNG_BYTES).unwrap();
        std::fs::write(dir.path().join("amy_baseimage.png"), PNG_BYTES).unwrap();

        let found = discover(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "amy_baseimage.png");

        let base = BaseImage::load(dir.path(), &LimitsConfig::default()).unwrap();
        assert_eq!(base.influencer_id, "amy");
    }

    #[test]
    fn test_discover_empty_dir_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(dir.path()).unwrap_err();
        assert!(matches!(err, LikenessError::InvalidInput(_)));
    }
}
