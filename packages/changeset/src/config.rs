//! Configuration constants and validation functions for changeset handling.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ChangesetError, Result};

/// Base URL of the public OpenStreetMap API.
pub const OSM_API_URL: &str = "http://api.openstreetmap.org";

/// HTTP timeout in seconds.
///
/// Large changesets can take a while to render on the API side.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Name of the root wrapper element of a changeset download.
pub const CHANGESET_ROOT_ELEMENT: &str = "osmChange";

/// File extension of changeset files in an archive directory.
pub const CHANGESET_FILE_EXTENSION: &str = "xml";

/// Changeset ID pattern: one or more decimal digits.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHANGESET_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Validate changeset ID format.
///
/// # Examples
/// ```
/// use osm_changeset::config::validate_changeset_id;
///
/// assert!(validate_changeset_id("1234567").is_ok());
/// assert!(validate_changeset_id("12a").is_err());
/// ```
pub fn validate_changeset_id(changeset_id: &str) -> Result<()> {
    if CHANGESET_ID_PATTERN.is_match(changeset_id) {
        Ok(())
    } else {
        Err(ChangesetError::InvalidChangesetId(changeset_id.to_string()))
    }
}

/// Build the download URL of a changeset.
///
/// A trailing slash on `api_base` is tolerated.
///
/// # Examples
/// ```
/// use osm_changeset::config::changeset_download_url;
///
/// assert_eq!(
///     changeset_download_url("http://api.openstreetmap.org/", "42"),
///     "http://api.openstreetmap.org/api/0.6/changeset/42/download"
/// );
/// ```
pub fn changeset_download_url(api_base: &str, changeset_id: &str) -> String {
    debug_assert!(
        CHANGESET_ID_PATTERN.is_match(changeset_id),
        "changeset_id should be validated before calling changeset_download_url"
    );
    let base = api_base.trim_end_matches('/');
    format!("{base}/api/0.6/changeset/{changeset_id}/download")
}

/// File name a downloaded changeset is stored under.
pub fn changeset_file_name(changeset_id: &str) -> String {
    format!("{changeset_id}.{CHANGESET_FILE_EXTENSION}")
}
