//! Scan report parsing.
//!
//! Decodes the raw bytes of one report file into [`ScanRecord`]s. The
//! parser is pure: no I/O, no partial output. Either the whole payload is
//! valid and every record is returned, or a [`ParseError`] is returned.
//!
//! # Accepted shapes
//!
//! - A JSON array of `{"scanResults": {...}}` wrappers
//! - A single `{"scanResults": {...}}` wrapper (treated as a one-element array)
//!
//! # Example
//!
//! ```
//! use vulnscan_core::parser::parse_report;
//!
//! let records = parse_report(br#"{"scanResults":{}}"#).unwrap();
//! assert_eq!(records.len(), 1);
//! assert!(records[0].findings.is_empty());
//! ```

mod error;
mod record;

pub use error::ParseError;
pub use record::{Finding, ScanRecord};

use record::ScanEnvelope;
use serde_json::Value;
use tracing::{debug, instrument};

/// Parses a report payload into its scan records.
///
/// # Errors
///
/// - [`ParseError::InvalidJson`] if the bytes are not valid JSON or a field
///   has the wrong type (e.g. a non-RFC 3339 timestamp)
/// - [`ParseError::NotAReport`] if the top-level value is neither an array
///   nor a wrapper object, or a wrapper lacks `scanResults`
/// - [`ParseError::MissingField`] if any finding has an empty `id` or `severity`
#[instrument(level = "debug", skip(raw), fields(bytes = raw.len()))]
pub fn parse_report(raw: &[u8]) -> Result<Vec<ScanRecord>, ParseError> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| ParseError::invalid_json(&e))?;

    let wrappers = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return Err(ParseError::not_a_report(format!(
                "expected an array or object at top level, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut records = Vec::with_capacity(wrappers.len());
    for (position, wrapper) in wrappers.into_iter().enumerate() {
        let Some(object) = wrapper.as_object() else {
            return Err(ParseError::not_a_report(format!(
                "entry {position} is {}, expected an object",
                json_kind(&wrapper)
            )));
        };
        if !object.contains_key("scanResults") {
            return Err(ParseError::not_a_report(format!(
                "entry {position} has no scanResults"
            )));
        }

        let envelope: ScanEnvelope =
            serde_json::from_value(wrapper).map_err(|e| ParseError::invalid_json(&e))?;
        let mut record = envelope.scan_results;
        validate_findings(&record)?;
        for finding in &mut record.findings {
            finding.dedup_risk_factors();
        }
        records.push(record);
    }

    debug!(
        records = records.len(),
        findings = records.iter().map(|r| r.findings.len()).sum::<usize>(),
        "parsed scan report"
    );

    Ok(records)
}

fn validate_findings(record: &ScanRecord) -> Result<(), ParseError> {
    for (index, finding) in record.findings.iter().enumerate() {
        let missing = if finding.identifier.trim().is_empty() {
            Some("id")
        } else if finding.severity.trim().is_empty() {
            Some("severity")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(ParseError::MissingField {
                scan_id: record.scan_id.clone(),
                index,
                field,
            });
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL_REPORT: &str = r#"[
      {
        "scanResults": {
          "scan_id": "VULN_SCAN_605",
          "timestamp": "2025-01-28T21:26:29Z",
          "scan_status": "completed",
          "resource_type": "container",
          "resource_name": "payment-processor:1.8.0",
          "vulnerabilities": [
            {
              "id": "CVE-2024-2222",
              "severity": "HIGH",
              "cvss": 8.2,
              "status": "active",
              "package_name": "spring-security",
              "current_version": "5.6.0",
              "fixed_version": "5.6.1",
              "description": "Authentication bypass in Spring Security",
              "published_date": "2025-01-27T00:00:00Z",
              "link": "https://nvd.nist.gov/vuln/detail/CVE-2024-2222",
              "risk_factors": ["Authentication Bypass", "High CVSS Score"]
            },
            {
              "id": "CVE-2024-2223",
              "severity": "LOW",
              "cvss": 3.1,
              "risk_factors": []
            }
          ]
        }
      },
      {
        "scanResults": {
          "scan_id": "VULN_SCAN_606",
          "vulnerabilities": []
        }
      }
    ]"#;

    #[test]
    fn test_parse_report_array_of_wrappers() {
        let records = parse_report(FULL_REPORT.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.scan_id, "VULN_SCAN_605");
        assert_eq!(first.status, "completed");
        assert_eq!(first.resource_type, "container");
        assert_eq!(first.resource_name, "payment-processor:1.8.0");
        assert!(first.timestamp.is_some());
        assert_eq!(first.findings.len(), 2);
        assert_eq!(first.findings[0].identifier, "CVE-2024-2222");
        assert_eq!(first.findings[1].severity, "LOW");

        assert!(records[1].findings.is_empty());
    }

    #[test]
    fn test_parse_report_empty_scan_results_object() {
        let records = parse_report(br#"{"scanResults":{}}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].scan_id, "");
        assert!(records[0].timestamp.is_none());
        assert!(records[0].findings.is_empty());
    }

    #[test]
    fn test_parse_report_empty_array_yields_no_records() {
        let records = parse_report(b"[]").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_report_malformed_json() {
        let err = parse_report(b"{\"scanResults\": ").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
        assert!(err.to_string().starts_with("invalid JSON"));
    }

    #[test]
    fn test_parse_report_top_level_string_rejected() {
        let err = parse_report(br#""hello""#).unwrap_err();
        assert!(matches!(err, ParseError::NotAReport { .. }));
    }

    #[test]
    fn test_parse_report_wrapper_without_scan_results_rejected() {
        let err = parse_report(br#"[{"scanResults":{}}, {"other":1}]"#).unwrap_err();
        assert!(matches!(err, ParseError::NotAReport { .. }));
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_parse_report_bad_timestamp_is_invalid_json() {
        let err = parse_report(br#"{"scanResults":{"timestamp":"yesterday"}}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_parse_report_missing_severity_fails_whole_payload() {
        let payload = br#"[
            {"scanResults":{"scan_id":"ok","vulnerabilities":[{"id":"CVE-1","severity":"HIGH"}]}},
            {"scanResults":{"scan_id":"bad","vulnerabilities":[{"id":"CVE-2"}]}}
        ]"#;
        let err = parse_report(payload).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                scan_id: "bad".to_string(),
                index: 0,
                field: "severity",
            }
        );
    }

    #[test]
    fn test_parse_report_missing_identifier() {
        let payload = br#"{"scanResults":{"vulnerabilities":[{"severity":"HIGH"}]}}"#;
        let err = parse_report(payload).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "id", .. }));
    }

    #[test]
    fn test_parse_report_null_fields_are_ingested() {
        let payload = br#"[{"scanResults":{"scan_id":"S","scan_status":null,"vulnerabilities":[
            {"id":"CVE-1","severity":"HIGH","cvss":null,"fixed_version":null,"link":null,"risk_factors":null}
        ]}}]"#;
        let records = parse_report(payload).unwrap();
        let finding = &records[0].findings[0];
        assert_eq!(records[0].status, "");
        assert_eq!(finding.identifier, "CVE-1");
        assert_eq!(finding.fixed_version, "");
        assert_eq!(finding.link, "");
        assert!(finding.risk_factors.is_empty());
    }

    #[test]
    fn test_parse_report_null_severity_is_missing_field() {
        let payload = br#"{"scanResults":{"vulnerabilities":[{"id":"CVE-1","severity":null}]}}"#;
        let err = parse_report(payload).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "severity", .. }));
    }

    #[test]
    fn test_parse_report_collapses_duplicate_risk_factors() {
        let payload = br#"{"scanResults":{"vulnerabilities":[
            {"id":"CVE-1","severity":"HIGH","risk_factors":["Exploit Available","Exploit Available","Public"]}
        ]}}"#;
        let records = parse_report(payload).unwrap();
        assert_eq!(
            records[0].findings[0].risk_factors,
            vec!["Exploit Available", "Public"]
        );
    }
}
