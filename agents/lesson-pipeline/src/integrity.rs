//! Integrity verification of locked source-of-truth files
//!
//! A lock manifest maps relative paths to hex digests. Verification reports
//! every missing, changed or unreadable file; re-locking is a deliberate
//! operator action and is never performed by the pipeline itself.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::contracts::SchemaId;
use crate::document;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

/// `{algorithm, locked: {relativePath: hexDigest}}`
///
/// Keys are kept sorted so a re-locked manifest diffs cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockManifest {
    pub algorithm: DigestAlgorithm,
    pub locked: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ViolationKind {
    Missing,
    Mismatch { expected: String, actual: String },
    Unreadable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityViolation {
    pub path: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl std::fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{}: file is missing", self.path),
            ViolationKind::Mismatch { expected, actual } => write!(
                f,
                "{}: digest mismatch (expected {}, found {})",
                self.path, expected, actual
            ),
            ViolationKind::Unreadable { reason } => {
                write!(f, "{}: file is unreadable ({})", self.path, reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub algorithm: DigestAlgorithm,
    pub checked: usize,
    pub passed: bool,
    pub violations: Vec<IntegrityViolation>,
}

impl IntegrityReport {
    /// Turn a failing report into an [`PipelineError::IntegrityMismatch`]
    pub fn into_result(self) -> Result<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(PipelineError::IntegrityMismatch {
                violations: self.violations.iter().map(|v| v.to_string()).collect(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelockReport {
    pub algorithm: DigestAlgorithm,
    /// Entries whose digest changed
    pub updated: Vec<String>,
    pub unchanged: usize,
    /// Entries kept at their old digest because the file is gone
    pub missing: Vec<String>,
}

/// Hex digest of a file, read in chunks
pub fn hash_file(path: &Path, algorithm: DigestAlgorithm) -> std::io::Result<String> {
    let file = File::open(path)?;
    match algorithm {
        DigestAlgorithm::Sha256 => digest_reader::<Sha256>(file),
        DigestAlgorithm::Sha512 => digest_reader::<Sha512>(file),
    }
}

fn digest_reader<D: Digest>(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Directory manifest paths are resolved against by default
pub fn default_root(manifest_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_manifest(path: &Path) -> Result<LockManifest> {
    document::load(SchemaId::LockManifest, Some(path))
}

pub fn write_manifest(path: &Path, manifest: &LockManifest) -> Result<()> {
    let value = document::emit(SchemaId::LockManifest, manifest)?;
    let mut json = serde_json::to_string_pretty(&value)
        .map_err(|e| PipelineError::Serialization(e.to_string()))?;
    json.push('\n');
    std::fs::write(path, json).map_err(|e| {
        PipelineError::file_error(format!("Failed to write '{}': {}", path.display(), e))
    })
}

/// Check every locked entry; never stops at the first violation
pub fn verify(manifest: &LockManifest, root: &Path) -> IntegrityReport {
    let mut violations = Vec::new();

    for (relative, expected) in &manifest.locked {
        let path = root.join(relative);
        if !path.is_file() {
            tracing::debug!(file = %relative, "locked file missing");
            violations.push(IntegrityViolation {
                path: relative.clone(),
                kind: ViolationKind::Missing,
            });
            continue;
        }

        match hash_file(&path, manifest.algorithm) {
            Ok(actual) if actual == *expected => {
                tracing::debug!(file = %relative, "locked file verified");
            }
            Ok(actual) => violations.push(IntegrityViolation {
                path: relative.clone(),
                kind: ViolationKind::Mismatch {
                    expected: expected.clone(),
                    actual,
                },
            }),
            Err(e) => violations.push(IntegrityViolation {
                path: relative.clone(),
                kind: ViolationKind::Unreadable {
                    reason: e.to_string(),
                },
            }),
        }
    }

    IntegrityReport {
        algorithm: manifest.algorithm,
        checked: manifest.locked.len(),
        passed: violations.is_empty(),
        violations,
    }
}

/// Recompute digests for every entry whose file exists
pub fn relock(manifest: &LockManifest, root: &Path) -> Result<(LockManifest, RelockReport)> {
    let mut locked = BTreeMap::new();
    let mut report = RelockReport {
        algorithm: manifest.algorithm,
        updated: Vec::new(),
        unchanged: 0,
        missing: Vec::new(),
    };

    for (relative, previous) in &manifest.locked {
        let path = root.join(relative);
        if !path.is_file() {
            tracing::warn!(file = %relative, "locked file missing, keeping previous digest");
            report.missing.push(relative.clone());
            locked.insert(relative.clone(), previous.clone());
            continue;
        }

        let digest = hash_file(&path, manifest.algorithm).map_err(|e| {
            PipelineError::file_error(format!("Failed to hash '{}': {}", path.display(), e))
        })?;
        if digest == *previous {
            report.unchanged += 1;
        } else {
            report.updated.push(relative.clone());
        }
        locked.insert(relative.clone(), digest);
    }

    Ok((
        LockManifest {
            algorithm: manifest.algorithm,
            locked,
        },
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        let sha256 = digest_reader::<Sha256>(&b"abc"[..]).unwrap();
        assert_eq!(
            sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let sha512 = digest_reader::<Sha512>(&b""[..]).unwrap();
        assert!(sha512.starts_with("cf83e1357eefb8bdf1542850d66d8007"));
        assert_eq!(sha512.len(), 128);
    }

    #[test]
    fn test_reports_every_violation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("b.json"), b"[]").unwrap();

        let mut locked = BTreeMap::new();
        locked.insert("a.json".to_string(), "00".to_string());
        locked.insert(
            "b.json".to_string(),
            hash_file(&dir.path().join("b.json"), DigestAlgorithm::Sha256).unwrap(),
        );
        locked.insert("gone.json".to_string(), "00".to_string());
        let manifest = LockManifest {
            algorithm: DigestAlgorithm::Sha256,
            locked,
        };

        let report = verify(&manifest, dir.path());
        assert!(!report.passed);
        assert_eq!(report.checked, 3);
        let paths: Vec<&str> = report.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["a.json", "gone.json"]);
        assert!(matches!(report.violations[1].kind, ViolationKind::Missing));

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("2 violation(s)"));
    }

    #[test]
    fn test_relock_keeps_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), b"{}").unwrap();

        let mut locked = BTreeMap::new();
        locked.insert("a.json".to_string(), "00".to_string());
        locked.insert("gone.json".to_string(), "11".to_string());
        let manifest = LockManifest {
            algorithm: DigestAlgorithm::Sha512,
            locked,
        };

        let (relocked, report) = relock(&manifest, dir.path()).unwrap();
        assert_eq!(report.updated, vec!["a.json"]);
        assert_eq!(report.missing, vec!["gone.json"]);
        assert_eq!(relocked.locked["gone.json"], "11");
        assert_eq!(relocked.locked["a.json"].len(), 128);
    }

    #[test]
    fn test_violation_serializes_flat() {
        let violation = IntegrityViolation {
            path: "a.json".to_string(),
            kind: ViolationKind::Mismatch {
                expected: "00".to_string(),
                actual: "11".to_string(),
            },
        };
        let value = serde_json::to_value(&violation).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"path": "a.json", "kind": "mismatch", "expected": "00", "actual": "11"})
        );
    }

    #[test]
    fn test_default_root_is_manifest_directory() {
        assert_eq!(default_root(Path::new("data/lock.json")), PathBuf::from("data"));
        assert_eq!(default_root(Path::new("lock.json")), PathBuf::from("."));
    }
}
