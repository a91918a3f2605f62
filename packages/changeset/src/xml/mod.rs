//! XML utilities for streaming over changeset documents.

mod utils;

pub use utils::*;
