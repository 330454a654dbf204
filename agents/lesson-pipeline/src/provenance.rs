//! Provenance assertion over generated artifacts
//!
//! Every `*.generated.json` file under a directory must be a JSON object
//! whose root `aiGenerated` member is boolean `true`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};

/// File-name suffix of generated artifacts
pub const ARTIFACT_SUFFIX: &str = ".generated.json";

/// Root member carrying the provenance flag
pub const PROVENANCE_FLAG: &str = "aiGenerated";

pub fn is_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(ARTIFACT_SUFFIX))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceFinding {
    pub file: String,
    pub reason: String,
}

impl std::fmt::Display for ProvenanceFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceReport {
    pub root: String,
    pub scanned: usize,
    pub passed: bool,
    pub violations: Vec<ProvenanceFinding>,
}

impl ProvenanceReport {
    pub fn into_result(self) -> Result<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(PipelineError::ProvenanceViolation {
                files: self.violations.iter().map(|v| v.to_string()).collect(),
            })
        }
    }
}

/// Why an artifact's content fails the provenance check, if it does
pub fn check_artifact(content: &str) -> Option<String> {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => return Some(format!("not valid JSON ({})", e)),
    };
    let root = match value.as_object() {
        Some(root) => root,
        None => return Some("root is not a JSON object".to_string()),
    };
    match root.get(PROVENANCE_FLAG) {
        Some(Value::Bool(true)) => None,
        Some(other) => Some(format!("{} is {}, expected true", PROVENANCE_FLAG, other)),
        None => Some(format!("{} is missing", PROVENANCE_FLAG)),
    }
}

/// Scan `root` recursively; violations are batched, never short-circuited
pub fn assert_provenance(root: &Path) -> Result<ProvenanceReport> {
    if !root.is_dir() {
        return Err(PipelineError::invalid_input(format!(
            "'{}' is not a directory",
            root.display()
        )));
    }

    let mut scanned = 0;
    let mut violations = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // An unreadable directory may hide artifacts
                let file = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                tracing::warn!(file = %file, error = %e, "cannot scan entry");
                violations.push(ProvenanceFinding {
                    file,
                    reason: format!("cannot be scanned ({})", e),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_artifact(entry.path()) {
            continue;
        }

        scanned += 1;
        let file = entry.path().display().to_string();
        let reason = match std::fs::read_to_string(entry.path()) {
            Ok(content) => check_artifact(&content),
            Err(e) => Some(format!("cannot be read ({})", e)),
        };

        match reason {
            Some(reason) => {
                tracing::debug!(file = %file, reason = %reason, "provenance violation");
                violations.push(ProvenanceFinding { file, reason });
            }
            None => tracing::debug!(file = %file, "provenance ok"),
        }
    }

    Ok(ProvenanceReport {
        root: root.display().to_string(),
        scanned,
        passed: violations.is_empty(),
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_artifact() {
        assert_eq!(check_artifact(r#"{"aiGenerated": true}"#), None);
        assert!(check_artifact(r#"{"aiGenerated": "true"}"#).is_some());
        assert!(check_artifact(r#"{"aiGenerated": false}"#).is_some());
        assert!(check_artifact(r#"{"lesson": {}}"#)
            .unwrap()
            .contains("missing"));
        assert!(check_artifact(r#"[{"aiGenerated": true}]"#)
            .unwrap()
            .contains("not a JSON object"));
        assert!(check_artifact("{").unwrap().contains("not valid JSON"));
    }

    #[test]
    fn test_naming_convention() {
        assert!(is_artifact(Path::new("out/abc.generated.json")));
        assert!(!is_artifact(Path::new("out/abc.json")));
        assert!(!is_artifact(Path::new("out/generated.json.bak")));
    }

    #[test]
    fn test_empty_directory_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), b"not json").unwrap();
        let report = assert_provenance(dir.path()).unwrap();
        assert!(report.passed);
        assert_eq!(report.scanned, 0);
    }

    #[test]
    fn test_nested_violations_are_batched() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("a.generated.json"), br#"{"aiGenerated": false}"#).unwrap();
        std::fs::write(nested.join("b.generated.json"), br#"{}"#).unwrap();
        std::fs::write(nested.join("c.generated.json"), br#"{"aiGenerated": true}"#).unwrap();

        let report = assert_provenance(dir.path()).unwrap();
        assert_eq!(report.scanned, 3);
        assert_eq!(report.violations.len(), 2);
        match report.into_result() {
            Err(PipelineError::ProvenanceViolation { files }) => {
                assert!(files[0].contains("a.generated.json"));
                assert!(files[1].contains("b.generated.json"));
            }
            other => panic!("expected provenance violation, got {other:?}"),
        }
    }
}
