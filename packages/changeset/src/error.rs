//! Error types for changeset parsing and downloading.

use thiserror::Error;

/// Main error type for the changeset library.
#[derive(Debug, Error)]
pub enum ChangesetError {
    /// Changeset ID is not a plain decimal number.
    #[error("Invalid changeset ID: '{0}'. Expected a decimal number (e.g., 1234567)")]
    InvalidChangesetId(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to download a changeset file.
    #[error("Failed to download changeset {changeset_id}: {source}")]
    ChangesetDownload {
        changeset_id: String,
        #[source]
        source: reqwest::Error,
    },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] quick_xml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for changeset operations.
pub type Result<T> = std::result::Result<T, ChangesetError>;
