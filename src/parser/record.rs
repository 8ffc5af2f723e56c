//! Scan report record types.
//!
//! These mirror the JSON emitted by the scanner: a list of
//! `{"scanResults": {...}}` wrappers, each holding one [`ScanRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Wrapper object around one scan record.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ScanEnvelope {
    #[serde(rename = "scanResults")]
    pub(crate) scan_results: ScanRecord,
}

/// One scan envelope: metadata plus its findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Scanner-assigned identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub scan_id: String,
    /// When the scanner captured the report.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Scanner-reported status (e.g. `completed`).
    #[serde(default, rename = "scan_status", deserialize_with = "null_as_default")]
    pub status: String,
    /// Kind of resource scanned (e.g. `container`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_type: String,
    /// Name of the resource scanned.
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_name: String,
    /// Findings in report order. Absent or `null` means none.
    #[serde(default, rename = "vulnerabilities", deserialize_with = "null_as_default")]
    pub findings: Vec<Finding>,
}

/// A single vulnerability finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Vulnerability identifier, e.g. a CVE id.
    #[serde(default, rename = "id", deserialize_with = "null_as_default")]
    pub identifier: String,
    /// Severity label exactly as reported (`CRITICAL`, `HIGH`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: String,
    /// CVSS score.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cvss: f64,
    /// Finding status (e.g. `fixed`, `active`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Affected package.
    #[serde(default, deserialize_with = "null_as_default")]
    pub package_name: String,
    /// Installed version.
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_version: String,
    /// Version that remediates the finding.
    #[serde(default, deserialize_with = "null_as_default")]
    pub fixed_version: String,
    /// Free-text summary.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// When the vulnerability was disclosed.
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    /// Reference link.
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    /// Risk factor tags, duplicates collapsed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_factors: Vec<String>,
}

impl Finding {
    /// Collapses duplicate risk factors, keeping the first occurrence.
    pub(crate) fn dedup_risk_factors(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.risk_factors.retain(|factor| seen.insert(factor.clone()));
    }
}

/// Reads an explicit `null` as the field's default, same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
