//! Recursive discovery of audio files.

use crate::config::CollectorConfig;
use crate::error::CollectionError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Collect every file under `root` whose extension is in the configured set.
///
/// Extensions are compared case-insensitively, so `Track.FLAC` matches
/// `flac`. Entries are visited in file-name order within each directory,
/// which keeps runs over the same tree reproducible.
///
/// # Arguments
/// * `root` - Directory to walk
/// * `config` - Recognised extensions
///
/// # Returns
/// Full paths of all matching files, or the first error met while walking
pub fn collect(root: &Path, config: &CollectorConfig) -> Result<Vec<PathBuf>, CollectionError> {
    if !root.exists() {
        return Err(CollectionError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CollectionError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|source| CollectionError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;

        // Symlinks are not descended into, but a link to a file still counts.
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        if matches_extension(entry.path(), &config.extensions) {
            files.push(entry.into_path());
        } else {
            debug!(path = %entry.path().display(), "Skipping non-audio file");
        }
    }

    info!(root = %root.display(), count = files.len(), "Collected audio files");
    Ok(files)
}

/// True when the extension of `path` is one of `extensions` (lowercase, no dot).
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}
