//! Error types for the fetch module.

use thiserror::Error;

/// Failure of a single fetch attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure (DNS, refused, TLS, ...).
    #[error("network error: {source}")]
    Network {
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeouts.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a status other than 200.
    #[error("HTTP status {status}")]
    HttpStatus {
        /// Status code returned.
        status: u16,
    },

    /// The body is larger than the configured ceiling.
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured ceiling in bytes.
        limit: u64,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {source}")]
    Body {
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Creates an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16) -> Self {
        Self::HttpStatus { status }
    }

    /// Maps a request error, separating timeouts from other network failures.
    pub(crate) fn from_request(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout
        } else {
            Self::Network { source }
        }
    }
}

/// Errors returned by a [`ContentSource`](super::ContentSource).
///
/// A `FetchError` is final: the source has already applied its own retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The repository identifier cannot be mapped to a content location.
    #[error("invalid repository '{repository}': {reason}")]
    InvalidRepository {
        /// Repository identifier as submitted.
        repository: String,
        /// Why it could not be mapped.
        reason: String,
    },

    /// The item name cannot be appended to a content location.
    #[error("invalid item name '{item}': {reason}")]
    InvalidItem {
        /// Item name as submitted.
        item: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Every attempt failed; carries the last failure.
    #[error("failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The failure observed on the final attempt.
        #[source]
        last: TransportError,
    },
}

impl FetchError {
    /// Creates an `InvalidRepository` error.
    pub fn invalid_repository(repository: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRepository {
            repository: repository.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidItem` error.
    pub fn invalid_item(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidItem {
            item: item.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Exhausted` error.
    #[must_use]
    pub fn exhausted(attempts: u32, last: TransportError) -> Self {
        Self::Exhausted { attempts, last }
    }
}
