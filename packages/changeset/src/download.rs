//! Bulk download of changeset files from an id list.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{changeset_download_url, changeset_file_name, validate_changeset_id};
use crate::error::{ChangesetError, Result};
use crate::http::Fetcher;

/// Outcome of one changeset download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Body written to the given path.
    Downloaded(PathBuf),
    /// A file for this changeset already exists; nothing fetched.
    Skipped(PathBuf),
}

/// Tally of a download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    /// Changeset ids that could not be fetched, with the reason.
    pub failed: Vec<(String, String)>,
}

impl DownloadSummary {
    /// Record the result of one changeset.
    ///
    /// Fetch failures and invalid ids are recorded and swallowed; filesystem
    /// errors are returned.
    pub fn record(&mut self, changeset_id: &str, result: Result<DownloadOutcome>) -> Result<()> {
        match result {
            Ok(DownloadOutcome::Downloaded(path)) => {
                tracing::info!(changeset_id, path = %path.display(), "downloaded changeset");
                self.downloaded += 1;
            }
            Ok(DownloadOutcome::Skipped(path)) => {
                tracing::debug!(changeset_id, path = %path.display(), "already downloaded");
                self.skipped += 1;
            }
            Err(e @ ChangesetError::Io(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(changeset_id, error = %e, "download failed");
                self.failed.push((changeset_id.to_string(), e.to_string()));
            }
        }
        Ok(())
    }
}

/// Read a newline-delimited list of changeset ids.
///
/// Lines are trimmed; blank lines are skipped. Ids are not validated here.
pub fn read_changeset_ids(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Download one changeset into `dir` as `{id}.xml`, unless it is already there.
///
/// Nothing is written when the request fails.
pub fn download_changeset<F: Fetcher>(
    fetcher: &F,
    api_base: &str,
    changeset_id: &str,
    dir: &Path,
) -> Result<DownloadOutcome> {
    validate_changeset_id(changeset_id)?;

    let path = dir.join(changeset_file_name(changeset_id));
    if path.exists() {
        return Ok(DownloadOutcome::Skipped(path));
    }

    let url = changeset_download_url(api_base, changeset_id);
    let body = fetcher.fetch(&url).map_err(|e| match e {
        ChangesetError::Http(source) => ChangesetError::ChangesetDownload {
            changeset_id: changeset_id.to_string(),
            source,
        },
        other => other,
    })?;

    fs::write(&path, body)?;
    Ok(DownloadOutcome::Downloaded(path))
}

/// Download every changeset in `ids` into `dir`, one at a time.
///
/// `on_item` is called with each id before it is fetched.
pub fn download_changesets<F, P>(
    fetcher: &F,
    api_base: &str,
    ids: &[String],
    dir: &Path,
    mut on_item: P,
) -> Result<DownloadSummary>
where
    F: Fetcher,
    P: FnMut(&str),
{
    let mut summary = DownloadSummary::default();
    for id in ids {
        on_item(id);
        let result = download_changeset(fetcher, api_base, id, dir);
        summary.record(id, result)?;
    }
    Ok(summary)
}
