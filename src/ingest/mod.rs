//! Bounded concurrent ingestion pipeline.
//!
//! This module provides:
//! - [`IngestEngine`] - fans a [`Batch`] out over at most N concurrent items
//! - [`ItemProcessor`] - fetch → parse → write for one item, with retry
//! - [`RetryPolicy`] - bounded retry with linear backoff for transient writes
//! - [`ResultAggregator`] / [`IngestReport`] - per-item outcome collection
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vulnscan_core::Database;
//! use vulnscan_core::fetch::{GithubSource, GithubSourceConfig};
//! use vulnscan_core::ingest::{Batch, IngestEngine, ItemProcessor, RetryPolicy, DEFAULT_CONCURRENCY};
//! use vulnscan_core::store::SqliteScanWriter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new_in_memory().await?;
//! let processor = ItemProcessor::new(
//!     Arc::new(GithubSource::new(GithubSourceConfig::default())?),
//!     Arc::new(SqliteScanWriter::new(db)),
//!     RetryPolicy::default(),
//! );
//! let engine = IngestEngine::new(DEFAULT_CONCURRENCY, processor)?;
//! let report = engine
//!     .dispatch(&Batch::new(
//!         "https://github.com/velancio/vulnerability_scans",
//!         vec!["vulnscan15.json".to_string()],
//!     ))
//!     .await;
//! println!("{} succeeded, {} failed", report.succeeded.len(), report.failed.len());
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod processor;
mod report;
mod retry;

pub use engine::{Batch, DEFAULT_CONCURRENCY, IngestEngine, MAX_CONCURRENCY, MIN_CONCURRENCY};
pub use error::{EngineError, ItemError};
pub use processor::{ItemProcessor, ProcessedItem};
pub use report::{IngestReport, ItemFailure, ItemOutcome, ResultAggregator};
pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
