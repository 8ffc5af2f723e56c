//! Error types for the ingestion pipeline.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::parser::ParseError;
use crate::store::WriteError;

/// Why one item failed. The `Display` text is what callers see in a report.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The content source could not deliver the item.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The payload is not a valid scan report.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The write unit failed and was rolled back.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Retryable failures persisted through every allowed attempt.
    #[error("failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Error from the final attempt.
        last: Box<ItemError>,
    },

    /// The item's task ended without producing an outcome.
    #[error("task aborted: {reason}")]
    Aborted {
        /// Panic or cancellation detail.
        reason: String,
    },
}

impl ItemError {
    /// Wraps the last error of a retry loop that ran out of attempts.
    #[must_use]
    pub fn exhausted(attempts: u32, last: ItemError) -> Self {
        Self::Exhausted {
            attempts,
            last: Box::new(last),
        }
    }

    /// Creates an error for a task that never reported back.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }
}

/// Error type for engine construction.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Concurrency outside the supported range.
    #[error("invalid concurrency value {value}: must be between {min} and {max}")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },
}
