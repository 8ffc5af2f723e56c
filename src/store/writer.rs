//! Transactional persistence of one item's scan records.
//!
//! Every call to [`ScanWriter::write_item`] is one atomic unit: either all
//! scan and finding rows for the item are committed, or none are.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, instrument, warn};

use super::error::{StoreErrorKind, WriteError, WriteStage};
use crate::db::Database;
use crate::parser::{Finding, ScanRecord};

/// Input for one write unit.
#[derive(Debug, Clone, Copy)]
pub struct ItemWrite<'a> {
    /// Repository the item was fetched from.
    pub repository: &'a str,
    /// Item name within the repository.
    pub item: &'a str,
    /// Ingestion time stored on every scan row of the unit.
    pub captured_at: DateTime<Utc>,
    /// Parsed records, written in order.
    pub records: &'a [ScanRecord],
}

/// Rows created by a committed write unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Generated scan keys in record order.
    pub scan_keys: Vec<i64>,
    /// Number of finding rows inserted.
    pub findings: usize,
}

/// Storage seam used by the ingestion pipeline.
#[async_trait]
pub trait ScanWriter: Send + Sync {
    /// Persists all records for one item as a single atomic unit.
    async fn write_item(&self, write: &ItemWrite<'_>) -> Result<WriteSummary, WriteError>;
}

/// [`ScanWriter`] backed by the `SQLite` pool.
#[derive(Debug, Clone)]
pub struct SqliteScanWriter {
    db: Database,
}

impl SqliteScanWriter {
    /// Creates a writer over the given database handle.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScanWriter for SqliteScanWriter {
    #[instrument(
        skip(self, write),
        fields(repository = %write.repository, item = %write.item, records = write.records.len())
    )]
    async fn write_item(&self, write: &ItemWrite<'_>) -> Result<WriteSummary, WriteError> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| WriteError::from_sqlx(WriteStage::Begin, &e))?;

        match insert_records(&mut tx, write).await {
            Ok(summary) => {
                tx.commit()
                    .await
                    .map_err(|e| WriteError::from_sqlx(WriteStage::Commit, &e))?;
                debug!(
                    scans = summary.scan_keys.len(),
                    findings = summary.findings,
                    "committed item"
                );
                Ok(summary)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(error = %rollback_error, "rollback failed, connection will discard the transaction");
                }
                Err(error)
            }
        }
    }
}

async fn insert_records(
    tx: &mut Transaction<'_, Sqlite>,
    write: &ItemWrite<'_>,
) -> Result<WriteSummary, WriteError> {
    let mut summary = WriteSummary::default();

    for record in write.records {
        let scan_key: i64 = sqlx::query_scalar(
            r"INSERT INTO scans (repo, file_path, scan_time, scan_id, timestamp)
              VALUES (?, ?, ?, ?, ?)
              RETURNING id",
        )
        .bind(write.repository)
        .bind(write.item)
        .bind(write.captured_at)
        .bind(&record.scan_id)
        .bind(record.timestamp)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| WriteError::from_sqlx(WriteStage::InsertScan, &e))?;

        for finding in &record.findings {
            insert_finding(tx, scan_key, finding).await?;
            summary.findings += 1;
        }
        summary.scan_keys.push(scan_key);
    }

    Ok(summary)
}

async fn insert_finding(
    tx: &mut Transaction<'_, Sqlite>,
    scan_key: i64,
    finding: &Finding,
) -> Result<(), WriteError> {
    let risk_factors = serde_json::to_string(&finding.risk_factors).map_err(|e| {
        WriteError::new(WriteStage::InsertFinding, StoreErrorKind::Other, e.to_string())
    })?;

    sqlx::query(
        r"INSERT INTO vulnerabilities (
            scan_id,
            cve_id,
            severity,
            cvss,
            status,
            package_name,
            current_version,
            fixed_version,
            description,
            published_date,
            link,
            risk_factors
          )
          VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(scan_key)
    .bind(&finding.identifier)
    .bind(&finding.severity)
    .bind(finding.cvss)
    .bind(&finding.status)
    .bind(&finding.package_name)
    .bind(&finding.current_version)
    .bind(&finding.fixed_version)
    .bind(&finding.description)
    .bind(finding.published_date)
    .bind(&finding.link)
    .bind(risk_factors)
    .execute(&mut **tx)
    .await
    .map_err(|e| WriteError::from_sqlx(WriteStage::InsertFinding, &e))?;

    Ok(())
}
