//! OSM Changeset - read OpenStreetMap changeset history files.
//!
//! This crate parses `osmChange` documents (as served by
//! `/api/0.6/changeset/{id}/download`) into flat edit records and tag rows,
//! checks archived files for emptiness, and downloads changesets by id.
//!
//! # Example
//!
//! ```
//! use osm_changeset::{extract_tags, parse_changeset};
//!
//! let xml = br#"<osmChange version="0.6"><create>
//!     <node id="1" version="1" changeset="42" user="alice" uid="7">
//!         <tag k="addr.street" v="Main St"/>
//!     </node>
//! </create></osmChange>"#;
//!
//! let record = parse_changeset(xml).unwrap().unwrap();
//! let tags = extract_tags(&record);
//! assert_eq!(tags[0].key, "addr-street");
//! assert_eq!(tags[0].changeset_id, 42);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, id validation and URL building
//! - [`types`]: Edit records, changes and tag rows
//! - [`error`]: Error types and Result alias
//! - [`xml`]: Attribute and name helpers for reader events
//! - [`parser`]: Streaming record extraction
//! - [`tags`]: Tag row flattening
//! - [`validity`]: Empty-changeset detection
//! - [`archive`]: Listing and cleaning a directory of changeset files
//! - [`http`]: HTTP client and the [`http::Fetcher`] seam
//! - [`download`]: Bulk download from an id list

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod parser;
pub mod tags;
pub mod types;
pub mod validity;
pub mod xml;

// Re-export main functions
pub use archive::{clean_directory, list_changeset_files};
pub use download::{download_changesets, read_changeset_ids};
pub use parser::{parse_changeset, parse_changeset_file, read_changeset_records, ChangesetRecords};
pub use tags::extract_tags;
pub use validity::is_valid;

// Re-export commonly used items
pub use config::{validate_changeset_id, OSM_API_URL};
pub use error::{ChangesetError, Result};
pub use types::{Change, EditRecord, EditType, ObjectType, Tag};
