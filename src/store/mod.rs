//! Scan storage.
//!
//! Write side: [`ScanWriter`] (the seam the ingestion pipeline depends on)
//! and its `SQLite` implementation [`SqliteScanWriter`].
//!
//! Read side: [`ScanStore`], a thin query layer over the persisted rows.
//!
//! # Example
//!
//! ```no_run
//! use vulnscan_core::Database;
//! use vulnscan_core::store::ScanStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new_in_memory().await?;
//! let store = ScanStore::new(db);
//! let high = store.findings_by_severity("HIGH").await?;
//! println!("{} high findings", high.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod row;
mod writer;

pub use error::{StoreError, StoreErrorKind, WriteError, WriteStage};
pub use row::{StoredFinding, StoredScan};
pub use writer::{ItemWrite, ScanWriter, SqliteScanWriter, WriteSummary};

use tracing::instrument;

use crate::db::Database;

/// Result type for read operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Read access to persisted scans and findings.
#[derive(Debug, Clone)]
pub struct ScanStore {
    db: Database,
}

impl ScanStore {
    /// Creates a store over the given database handle.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a writer sharing this store's pool.
    #[must_use]
    pub fn writer(&self) -> SqliteScanWriter {
        SqliteScanWriter::new(self.db.clone())
    }

    /// Returns every finding whose severity equals `severity` exactly.
    ///
    /// Matching is case-sensitive against the stored value. No match is an
    /// empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn findings_by_severity(&self, severity: &str) -> Result<Vec<StoredFinding>> {
        let rows = sqlx::query_as::<_, StoredFinding>(
            r"SELECT id, scan_id, cve_id, severity, cvss, status, package_name,
                     current_version, fixed_version, description, published_date,
                     link, risk_factors
              FROM vulnerabilities
              WHERE severity = ?
              ORDER BY id ASC",
        )
        .bind(severity)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Returns the scan rows recorded for `item` in `repository`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn scans_for_item(&self, repository: &str, item: &str) -> Result<Vec<StoredScan>> {
        let rows = sqlx::query_as::<_, StoredScan>(
            r"SELECT id, repo, file_path, scan_time, scan_id, timestamp
              FROM scans
              WHERE repo = ? AND file_path = ?
              ORDER BY id ASC",
        )
        .bind(repository)
        .bind(item)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Returns the findings attached to one scan key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn findings_for_scan(&self, scan_key: i64) -> Result<Vec<StoredFinding>> {
        let rows = sqlx::query_as::<_, StoredFinding>(
            r"SELECT id, scan_id, cve_id, severity, cvss, status, package_name,
                     current_version, fixed_version, description, published_date,
                     link, risk_factors
              FROM vulnerabilities
              WHERE scan_id = ?
              ORDER BY id ASC",
        )
        .bind(scan_key)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Total number of scan rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    pub async fn count_scans(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scans")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Total number of finding rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    pub async fn count_findings(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vulnerabilities")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}
