//! Error types for scan report parsing.

use thiserror::Error;

/// Errors that can occur while decoding a scan report payload.
///
/// Parsing is all-or-nothing: any of these means no records were produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload is not well-formed JSON, or a field has the wrong type.
    #[error("invalid JSON: {detail}")]
    InvalidJson {
        /// Decoder message, including line/column when available.
        detail: String,
    },

    /// The payload is JSON but not shaped like a scan report.
    #[error("invalid scan report: {reason}")]
    NotAReport {
        /// What was structurally wrong.
        reason: String,
    },

    /// A finding is missing a field that identifies it.
    #[error("invalid scan report: finding {index} in scan '{scan_id}' has empty {field}")]
    MissingField {
        /// Scan identifier of the record holding the finding.
        scan_id: String,
        /// Zero-based position of the finding within its record.
        index: usize,
        /// JSON key that was empty or absent.
        field: &'static str,
    },
}

impl ParseError {
    /// Wraps a `serde_json` decode failure.
    #[must_use]
    pub fn invalid_json(error: &serde_json::Error) -> Self {
        Self::InvalidJson {
            detail: error.to_string(),
        }
    }

    /// Creates a structural error with the given reason.
    #[must_use]
    pub fn not_a_report(reason: impl Into<String>) -> Self {
        Self::NotAReport {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_invalid_json_message_prefix() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let msg = ParseError::invalid_json(&err).to_string();
        assert!(msg.starts_with("invalid JSON: "), "got: {msg}");
    }

    #[test]
    fn test_parse_error_missing_field_message() {
        let err = ParseError::MissingField {
            scan_id: "scan-1".to_string(),
            index: 2,
            field: "severity",
        };
        let msg = err.to_string();
        assert!(msg.contains("finding 2"));
        assert!(msg.contains("scan-1"));
        assert!(msg.contains("severity"));
    }
}
