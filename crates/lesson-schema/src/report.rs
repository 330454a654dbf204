//! Validation report types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single failed constraint inside a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Location inside the validated document (`$`, `$.pages[0].title`)
    pub path: String,
    /// Schema keyword that rejected the value
    pub keyword: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationFinding {
    pub fn new(
        path: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            keyword: keyword.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.path, self.message, self.keyword)
    }
}

/// Outcome of validating one document against one schema
///
/// There is no partial validity: `valid` is true only when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// Build a report from collected findings
    pub fn from_findings(errors: Vec<ValidationFinding>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Render every finding on its own line, for stderr diagnostics
    pub fn diagnostic(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_valid_only_without_errors() {
        assert!(ValidationReport::from_findings(vec![]).valid);
        let report = ValidationReport::from_findings(vec![ValidationFinding::new(
            "$.title",
            "type",
            "expected string",
        )]);
        assert!(!report.valid);
        assert_eq!(report.diagnostic(), "  - $.title: expected string [type]");
    }

    #[test]
    fn test_errors_omitted_when_valid() {
        let json = serde_json::to_value(ValidationReport::from_findings(vec![])).unwrap();
        assert_eq!(json, serde_json::json!({"valid": true}));
    }
}
