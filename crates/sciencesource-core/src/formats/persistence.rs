//! # Persistence Format
//!
//! JSON serialization for article graphs.
//!
//! The pure functions (`article_to_json`, `article_from_json`) carry the
//! format; `save` and `load` add file I/O. Saving writes a sibling temporary
//! file and renames it over the destination, so an interrupted save never
//! leaves a truncated record behind and never touches the in-memory graph.
//!
//! ## Limits
//!
//! Records larger than `MAX_RECORD_SIZE` are rejected before parsing.

use crate::{Article, SyncError};
use std::path::{Path, PathBuf};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted size of a persisted article record (64 MB).
pub const MAX_RECORD_SIZE: u64 = 64 * 1024 * 1024;

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize an article graph to JSON bytes.
///
/// This is a pure transformation - no file I/O.
pub fn article_to_json(article: &Article) -> Result<Vec<u8>, SyncError> {
    let mut bytes =
        serde_json::to_vec_pretty(article).map_err(|e| SyncError::Serialization(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Deserialize an article graph from JSON bytes.
///
/// This is a pure transformation - no file I/O.
pub fn article_from_json(bytes: &[u8]) -> Result<Article, SyncError> {
    if bytes.len() as u64 > MAX_RECORD_SIZE {
        return Err(SyncError::Serialization(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_RECORD_SIZE
        )));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| SyncError::Serialization(format!("Failed to parse article record: {}", e)))
}

// =============================================================================
// FILE I/O
// =============================================================================

/// Write an article graph to `path`.
pub fn save(article: &Article, path: impl AsRef<Path>) -> Result<(), SyncError> {
    let path = path.as_ref();
    let data = article_to_json(article)?;
    let tmp = temp_path(path);

    std::fs::write(&tmp, &data)
        .map_err(|e| SyncError::Io(format!("Write {}: {}", tmp.display(), e)))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        SyncError::Io(format!("Replace {}: {}", path.display(), e))
    })?;

    tracing::debug!(path = %path.display(), bytes = data.len(), stage = %article.stage(), "article saved");
    Ok(())
}

/// Read an article graph from `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Article, SyncError> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .map_err(|e| SyncError::Io(format!("Cannot read {}: {}", path.display(), e)))?;
    if metadata.len() > MAX_RECORD_SIZE {
        return Err(SyncError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_RECORD_SIZE
        )));
    }

    let data = std::fs::read(path)
        .map_err(|e| SyncError::Io(format!("Read {}: {}", path.display(), e)))?;
    article_from_json(&data)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// =============================================================================
// TESTS
// =============================================================================
