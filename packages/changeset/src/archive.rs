//! Local archive of changeset files: listing and pruning.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::config::CHANGESET_FILE_EXTENSION;
use crate::error::Result;
use crate::validity::is_valid_reader;

/// Tally of a clean run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub checked: usize,
    pub removed: Vec<PathBuf>,
}

/// List the `*.xml` files directly inside `dir`, sorted by path.
pub fn list_changeset_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_changeset = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == CHANGESET_FILE_EXTENSION);
        if is_changeset {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Check a changeset file on disk, reading only up to its first element.
pub fn is_valid_file(path: &Path) -> Result<bool> {
    let file = File::open(path)?;
    Ok(is_valid_reader(BufReader::new(file)))
}

/// Delete every empty or invalid changeset file in `dir`.
///
/// Deletion is permanent; no copy is kept.
pub fn clean_directory(dir: &Path) -> Result<CleanSummary> {
    let mut summary = CleanSummary::default();

    for path in list_changeset_files(dir)? {
        summary.checked += 1;
        if !is_valid_file(&path)? {
            fs::remove_file(&path)?;
            tracing::info!(path = %path.display(), "deleted empty changeset file");
            summary.removed.push(path);
        }
    }

    Ok(summary)
}
