//! Retry policy for the per-item pipeline.
//!
//! Only transient write failures (lock or contention) are retried. Fetch
//! failures are not, because the content source already retries them.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use vulnscan_core::ingest::{FailureType, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(
//!     policy.should_retry(FailureType::Transient, 1),
//!     RetryDecision::Retry { delay: Duration::from_millis(100), attempt: 2 }
//! );
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::error::ItemError;

/// Attempts per item, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Backoff unit; the wait after attempt `n` is `n` units.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Classification of an item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Storage contention; the same attempt may succeed shortly.
    Transient,
    /// Anything else. Retrying would not help.
    Permanent,
}

/// Decision on whether to run another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run attempt `attempt` after waiting `delay`.
    Retry {
        /// How long to wait first.
        delay: Duration,
        /// 1-indexed number of the next attempt.
        attempt: u32,
    },
    /// Stop and report the failure.
    DoNotRetry {
        /// Why no further attempt is made.
        reason: String,
        /// True when the attempt budget ran out on a retryable failure.
        exhausted: bool,
    },
}

/// Bounded retry with linear backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Decides what to do after `attempt` (1-indexed) failed with `failure_type`.
    #[instrument(level = "debug", skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure".to_string(),
                exhausted: false,
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, "attempt budget exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
                exhausted: true,
            };
        }

        RetryDecision::Retry {
            delay: self.base_delay * attempt,
            attempt: attempt + 1,
        }
    }
}

/// Classifies an item error for retry decisions.
#[must_use]
pub fn classify_error(error: &ItemError) -> FailureType {
    match error {
        ItemError::Write(write) if write.is_transient() => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, TransportError};
    use crate::parser::ParseError;
    use crate::store::{StoreErrorKind, WriteError, WriteStage};

    #[test]
    fn test_default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.base_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_new_clamps_zero_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_transient_retries_with_linear_delay() {
        let policy = RetryPolicy::new(4, Duration::from_millis(10));
        for attempt in 1..4 {
            assert_eq!(
                policy.should_retry(FailureType::Transient, attempt),
                RetryDecision::Retry {
                    delay: Duration::from_millis(10) * attempt,
                    attempt: attempt + 1,
                }
            );
        }
    }

    #[test]
    fn test_transient_stops_at_budget() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Transient, 2);
        assert!(matches!(
            decision,
            RetryDecision::DoNotRetry { exhausted: true, .. }
        ));
    }

    #[test]
    fn test_permanent_never_retries() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Permanent, 1);
        assert!(matches!(
            decision,
            RetryDecision::DoNotRetry { exhausted: false, .. }
        ));
    }

    #[test]
    fn test_classify_error() {
        let locked = ItemError::Write(WriteError::new(
            WriteStage::InsertScan,
            StoreErrorKind::BusyOrLocked,
            "database is locked",
        ));
        assert_eq!(classify_error(&locked), FailureType::Transient);

        let constraint = ItemError::Write(WriteError::new(
            WriteStage::InsertFinding,
            StoreErrorKind::ConstraintViolation,
            "CHECK constraint failed",
        ));
        assert_eq!(classify_error(&constraint), FailureType::Permanent);

        let fetch = ItemError::Fetch(FetchError::exhausted(2, TransportError::http_status(503)));
        assert_eq!(classify_error(&fetch), FailureType::Permanent);

        let parse = ItemError::Parse(ParseError::not_a_report("bad"));
        assert_eq!(classify_error(&parse), FailureType::Permanent);
    }
}
