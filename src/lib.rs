//! Vulnscan Core Library
//!
//! Ingests vulnerability scan reports hosted in a repository into `SQLite`,
//! several items at a time, and answers simple queries over the stored
//! findings.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`db`] - Database connection and schema management
//! - [`fetch`] - Raw content retrieval (`ContentSource`, GitHub client)
//! - [`parser`] - Scan report decoding and validation
//! - [`store`] - Transactional writes and read queries
//! - [`ingest`] - Bounded concurrent pipeline with retry and aggregation
//! - [`api`] - HTTP routes over the pipeline and the store

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod db;
pub mod fetch;
pub mod ingest;
pub mod parser;
pub mod store;

// Re-export commonly used types
pub use db::{Database, DatabaseOptions, DbError};
pub use fetch::{ContentSource, FetchError, GithubSource, GithubSourceConfig};
pub use ingest::{
    Batch, DEFAULT_CONCURRENCY, EngineError, IngestEngine, IngestReport, ItemError,
    ItemProcessor, RetryPolicy,
};
pub use parser::{Finding, ParseError, ScanRecord, parse_report};
pub use store::{ScanStore, ScanWriter, SqliteScanWriter, WriteError};
