//! Retrieval of raw report content.
//!
//! The ingestion pipeline only sees the [`ContentSource`] trait; the
//! production implementation is [`GithubSource`], which reads files from a
//! repository's raw content host and retries transient failures itself.
//!
//! # Example
//!
//! ```no_run
//! use vulnscan_core::fetch::{ContentSource, GithubSource, GithubSourceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = GithubSource::new(GithubSourceConfig::default())?;
//! let bytes = source
//!     .fetch("https://github.com/velancio/vulnerability_scans", "vulnscan15.json")
//!     .await?;
//! println!("fetched {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;

pub use client::{GithubSource, GithubSourceConfig};
pub use error::{FetchError, TransportError};

use async_trait::async_trait;

/// Source of raw item content.
///
/// Implementations resolve `repository` + `item` to a location, make at
/// least one retry on transient failure, and report a non-success status as
/// an error value rather than panicking.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches the raw bytes of `item` within `repository`.
    async fn fetch(&self, repository: &str, item: &str) -> Result<Vec<u8>, FetchError>;
}
