//! Error types for scan storage.

use std::fmt;

use thiserror::Error;

/// Structured classification for storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// `SQLite` returned busy/locked under concurrent access.
    BusyOrLocked,
    /// Constraint failure (unique/foreign-key/check/not-null).
    ConstraintViolation,
    /// Connection pool timed out waiting for a free connection.
    PoolTimeout,
    /// Connection pool is closed.
    PoolClosed,
    /// Expected row was not found.
    RowNotFound,
    /// Filesystem or transport IO failure.
    Io,
    /// SQL protocol/driver error.
    Protocol,
    /// Unclassified failure.
    Other,
}

impl StoreErrorKind {
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::Protocol(_) => Self::Protocol,
            sqlx::Error::Database(database_error) => {
                classify_database_error(database_error.as_ref())
            }
            _ => Self::Other,
        }
    }

    /// Returns true for contention conditions expected to clear on their own.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::BusyOrLocked | Self::PoolTimeout)
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::RowNotFound => "row_not_found",
            Self::Io => "io",
            Self::Protocol => "protocol",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

fn classify_database_error(
    database_error: &(dyn sqlx::error::DatabaseError + 'static),
) -> StoreErrorKind {
    let code = database_error.code();
    if matches!(
        code.as_deref(),
        Some("SQLITE_BUSY" | "SQLITE_LOCKED" | "5" | "6" | "261" | "262" | "517")
    ) {
        return StoreErrorKind::BusyOrLocked;
    }

    if database_error.is_unique_violation()
        || database_error.is_foreign_key_violation()
        || database_error.is_check_violation()
        || code
            .as_deref()
            .is_some_and(|value| value.starts_with("SQLITE_CONSTRAINT"))
    {
        return StoreErrorKind::ConstraintViolation;
    }

    let message = database_error.message().to_ascii_lowercase();
    if message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("database is busy")
    {
        return StoreErrorKind::BusyOrLocked;
    }

    StoreErrorKind::Other
}

/// Step of the write unit that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// Opening the transaction.
    Begin,
    /// Inserting a scan row.
    InsertScan,
    /// Inserting a finding row.
    InsertFinding,
    /// Committing the transaction.
    Commit,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Begin => "db transaction",
            Self::InsertScan => "insert scan",
            Self::InsertFinding => "insert vulnerability",
            Self::Commit => "commit",
        };
        write!(f, "{label}")
    }
}

/// Failure of one item's write unit. Nothing from the unit was kept.
#[derive(Debug, Clone, Error)]
#[error("{stage} failed: {message}")]
pub struct WriteError {
    /// Where in the unit the failure happened.
    pub stage: WriteStage,
    /// Classification used for retry decisions.
    pub kind: StoreErrorKind,
    /// Human-readable storage error text.
    pub message: String,
}

impl WriteError {
    /// Creates a write error from a storage driver error.
    #[must_use]
    pub fn from_sqlx(stage: WriteStage, error: &sqlx::Error) -> Self {
        Self {
            stage,
            kind: StoreErrorKind::from_sqlx(error),
            message: error.to_string(),
        }
    }

    /// Creates a write error with an explicit classification.
    pub fn new(stage: WriteStage, kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    /// Returns true when retrying the whole unit may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Errors from storage read operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error ({kind}): {message}")]
    Database {
        /// Typed classification.
        kind: StoreErrorKind,
        /// Human-readable database error text.
        message: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            kind: StoreErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}
