//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /scan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Repository URL, e.g. `https://github.com/owner/repo`.
    #[serde(alias = "repo")]
    pub repository: String,
    /// Report files to ingest.
    #[serde(alias = "files")]
    pub items: Vec<String>,
}

/// Body of `POST /query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub filters: QueryFilters,
}

/// Filters accepted by `POST /query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilters {
    /// Exact, case-sensitive severity to match.
    #[serde(default)]
    pub severity: Option<String>,
}

/// Error body returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_request_accepts_short_aliases() {
        let req: ScanRequest =
            serde_json::from_str(r#"{"repo":"https://github.com/o/r","files":["a.json"]}"#)
                .unwrap();
        assert_eq!(req.repository, "https://github.com/o/r");
        assert_eq!(req.items, vec!["a.json"]);
    }

    #[test]
    fn test_scan_request_requires_items() {
        assert!(serde_json::from_str::<ScanRequest>(r#"{"repository":"r"}"#).is_err());
    }

    #[test]
    fn test_query_request_missing_severity() {
        let req: QueryRequest = serde_json::from_str(r#"{"filters":{}}"#).unwrap();
        assert!(req.filters.severity.is_none());
    }
}
