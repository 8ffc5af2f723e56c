//! Row types returned by the read path.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::parser::Finding;

/// A persisted scan row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct StoredScan {
    /// Generated scan key.
    pub id: i64,
    /// Repository the item came from.
    pub repo: String,
    /// Item name within the repository.
    pub file_path: String,
    /// Ingestion time.
    pub scan_time: DateTime<Utc>,
    /// Scanner-assigned identifier from the report.
    pub scan_id: String,
    /// Report capture time, if present.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A persisted finding row.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StoredFinding {
    /// Generated finding key.
    pub id: i64,
    /// Key of the owning scan row.
    pub scan_id: i64,
    /// Vulnerability identifier, e.g. a CVE id.
    pub cve_id: String,
    /// Severity label as reported.
    pub severity: String,
    /// CVSS score.
    pub cvss: f64,
    /// Finding status.
    pub status: String,
    /// Affected package.
    pub package_name: String,
    /// Installed version.
    pub current_version: String,
    /// Version that remediates the finding.
    pub fixed_version: String,
    /// Free-text summary.
    pub description: String,
    /// Disclosure time, if reported.
    pub published_date: Option<DateTime<Utc>>,
    /// Reference link.
    pub link: String,
    /// JSON array text as stored.
    pub risk_factors: String,
}

impl StoredFinding {
    /// Decodes the stored risk factor list. Undecodable text yields an empty list.
    #[must_use]
    pub fn risk_factors(&self) -> Vec<String> {
        serde_json::from_str(&self.risk_factors).unwrap_or_default()
    }

    /// Converts the row back into the report's finding shape.
    #[must_use]
    pub fn into_finding(self) -> Finding {
        let risk_factors = self.risk_factors();
        Finding {
            identifier: self.cve_id,
            severity: self.severity,
            cvss: self.cvss,
            status: self.status,
            package_name: self.package_name,
            current_version: self.current_version,
            fixed_version: self.fixed_version,
            description: self.description,
            published_date: self.published_date,
            link: self.link,
            risk_factors,
        }
    }
}
