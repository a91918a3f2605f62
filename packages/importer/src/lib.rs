//! OSM Edit History - import OpenStreetMap changeset history into PostgreSQL.
//!
//! Changeset files are parsed with [`osm_changeset`] and written through a
//! [`PersistenceGateway`]; [`PgGateway`] stores them in the `changes` and
//! `tags` tables created by [`db::run_migrations`].

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod import;

pub use config::DatabaseConfig;
pub use db::{create_pool, run_migrations};
pub use error::{ImportError, Result};
pub use gateway::{PersistenceGateway, PgGateway};
pub use import::{import_directory, import_file, FileOutcome, ImportMode, ImportSummary};
