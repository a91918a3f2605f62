//! HTTP client for downloading changesets from the OSM API.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::Result;

/// User agent string identifying this tool.
const USER_AGENT: &str = concat!("osm-changeset/", env!("CARGO_PKG_VERSION"));

/// Source of raw response bodies.
pub trait Fetcher {
    /// Fetch a URL and return the body of a successful response.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl Fetcher for Client {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        download_bytes(self, url)
    }
}

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with appropriate timeout and user agent.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download content from a URL.
///
/// Non-success statuses are errors; the body is not read for them.
pub fn download_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    tracing::debug!(url, "requesting");
    let response = client.get(url).send()?.error_for_status()?;
    let bytes = response.bytes()?;
    Ok(bytes.to_vec())
}
