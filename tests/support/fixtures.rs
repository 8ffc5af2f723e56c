use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use url::Url;
use vulnscan_core::fetch::{GithubSource, GithubSourceConfig};
use vulnscan_core::ingest::{IngestEngine, ItemProcessor, RetryPolicy};
use vulnscan_core::store::ScanStore;
use vulnscan_core::{Database, DatabaseOptions};

/// Repository identifier used throughout the integration tests.
pub const REPO: &str = "https://github.com/acme/scans";

/// Path prefix the mock raw host serves for [`REPO`].
pub const RAW_PREFIX: &str = "/acme/scans/main";

/// Creates a file database in a fresh temp directory.
pub async fn setup_test_db() -> Result<(Database, TempDir), Box<dyn std::error::Error>> {
    setup_test_db_with_options(DatabaseOptions::default()).await
}

pub async fn setup_test_db_with_options(
    options: DatabaseOptions,
) -> Result<(Database, TempDir), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new_with_options(&db_path, options).await?;
    Ok((db, temp_dir))
}

/// Content source pointed at a mock raw host with millisecond backoff.
pub fn mock_source(base_uri: &str) -> Result<GithubSource, Box<dyn std::error::Error>> {
    Ok(GithubSource::new(GithubSourceConfig {
        raw_base_url: Some(Url::parse(base_uri)?),
        retry_unit: Duration::from_millis(10),
        ..GithubSourceConfig::default()
    })?)
}

/// Retry policy with the production budget and a tiny backoff unit.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(5))
}

/// Engine over a mock raw host and the given store, N = 3.
pub fn mock_engine(
    base_uri: &str,
    store: &ScanStore,
) -> Result<IngestEngine, Box<dyn std::error::Error>> {
    let processor = ItemProcessor::new(
        Arc::new(mock_source(base_uri)?),
        Arc::new(store.writer()),
        fast_policy(),
    );
    Ok(IngestEngine::new(3, processor)?)
}

/// A one-record report with the given findings as `(id, severity)` pairs.
pub fn report_body(scan_id: &str, findings: &[(&str, &str)]) -> String {
    let vulnerabilities: Vec<serde_json::Value> = findings
        .iter()
        .map(|(id, severity)| {
            serde_json::json!({
                "id": id,
                "severity": severity,
                "cvss": 7.5,
                "status": "active",
                "package_name": "openssl",
                "current_version": "1.1.1t",
                "fixed_version": "1.1.1u",
                "description": "test finding",
                "published_date": "2025-01-24T00:00:00Z",
                "link": format!("https://nvd.nist.gov/vuln/detail/{id}"),
                "risk_factors": ["Remote Code Execution", "High CVSS Score"]
            })
        })
        .collect();

    serde_json::json!([{
        "scanResults": {
            "scan_id": scan_id,
            "timestamp": "2025-01-28T10:30:00Z",
            "scan_status": "completed",
            "resource_type": "container",
            "resource_name": "api:1.0",
            "vulnerabilities": vulnerabilities
        }
    }])
    .to_string()
}
