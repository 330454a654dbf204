//! Embedded JSON-Schema documents
//!
//! Every document that crosses a stage boundary has exactly one schema here.
//! The schema files are compiled into the binary so a stage can never run
//! against a schema that differs from the one it was built with.

use lesson_schema::{Schema, SchemaError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

static COMPILED: OnceLock<HashMap<SchemaId, Result<Schema, SchemaError>>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaId {
    DerivationContract,
    StatutoryDocument,
    BoardSpec,
    LessonStructure,
    SlotContract,
    SlotMapping,
    SlotDocument,
    GenerationJobSpec,
    AllowlistPolicy,
    GenerationReport,
    TelemetryEvent,
    LockManifest,
    ExecutorConfig,
    PromptContract,
    SpecDiff,
    LessonBundle,
}

impl SchemaId {
    pub const ALL: [SchemaId; 16] = [
        SchemaId::DerivationContract,
        SchemaId::StatutoryDocument,
        SchemaId::BoardSpec,
        SchemaId::LessonStructure,
        SchemaId::SlotContract,
        SchemaId::SlotMapping,
        SchemaId::SlotDocument,
        SchemaId::GenerationJobSpec,
        SchemaId::AllowlistPolicy,
        SchemaId::GenerationReport,
        SchemaId::TelemetryEvent,
        SchemaId::LockManifest,
        SchemaId::ExecutorConfig,
        SchemaId::PromptContract,
        SchemaId::SpecDiff,
        SchemaId::LessonBundle,
    ];

    /// Short name used on the command line and in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            SchemaId::DerivationContract => "derivation-contract",
            SchemaId::StatutoryDocument => "statutory-document",
            SchemaId::BoardSpec => "board-spec",
            SchemaId::LessonStructure => "lesson-structure",
            SchemaId::SlotContract => "slot-contract",
            SchemaId::SlotMapping => "slot-mapping",
            SchemaId::SlotDocument => "slot-document",
            SchemaId::GenerationJobSpec => "generation-job-spec",
            SchemaId::AllowlistPolicy => "allowlist-policy",
            SchemaId::GenerationReport => "generation-report",
            SchemaId::TelemetryEvent => "telemetry-event",
            SchemaId::LockManifest => "lock-manifest",
            SchemaId::ExecutorConfig => "executor-config",
            SchemaId::PromptContract => "prompt-contract",
            SchemaId::SpecDiff => "spec-diff",
            SchemaId::LessonBundle => "lesson-bundle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }

    /// Raw schema text
    pub fn source(&self) -> &'static str {
        match self {
            SchemaId::DerivationContract => include_str!("../schemas/derivation-contract.schema.json"),
            SchemaId::StatutoryDocument => include_str!("../schemas/statutory-document.schema.json"),
            SchemaId::BoardSpec => include_str!("../schemas/board-spec.schema.json"),
            SchemaId::LessonStructure => include_str!("../schemas/lesson-structure.schema.json"),
            SchemaId::SlotContract => include_str!("../schemas/slot-contract.schema.json"),
            SchemaId::SlotMapping => include_str!("../schemas/slot-mapping.schema.json"),
            SchemaId::SlotDocument => include_str!("../schemas/slot-document.schema.json"),
            SchemaId::GenerationJobSpec => include_str!("../schemas/generation-job-spec.schema.json"),
            SchemaId::AllowlistPolicy => include_str!("../schemas/allowlist-policy.schema.json"),
            SchemaId::GenerationReport => include_str!("../schemas/generation-report.schema.json"),
            SchemaId::TelemetryEvent => include_str!("../schemas/telemetry-event.schema.json"),
            SchemaId::LockManifest => include_str!("../schemas/lock-manifest.schema.json"),
            SchemaId::ExecutorConfig => include_str!("../schemas/executor-config.schema.json"),
            SchemaId::PromptContract => include_str!("../schemas/prompt-contract.schema.json"),
            SchemaId::SpecDiff => include_str!("../schemas/spec-diff.schema.json"),
            SchemaId::LessonBundle => include_str!("../schemas/lesson-bundle.schema.json"),
        }
    }

    /// Parsed schema document
    pub fn document(&self) -> Result<Value, SchemaError> {
        serde_json::from_str(self.source()).map_err(|_| SchemaError::InvalidRoot)
    }

    /// Compile the embedded schema in strict mode
    pub fn compile(&self) -> Result<Schema, SchemaError> {
        Schema::compile(&self.document()?)
    }

    /// The embedded schema, compiled once per process
    pub fn compiled(&self) -> Result<&'static Schema, SchemaError> {
        let registry = COMPILED.get_or_init(|| {
            Self::ALL
                .iter()
                .map(|id| (*id, id.compile()))
                .collect()
        });
        match registry.get(self) {
            Some(Ok(schema)) => Ok(schema),
            Some(Err(e)) => Err(e.clone()),
            None => Err(SchemaError::Rejected {
                reason: format!("schema '{}' is not registered", self),
            }),
        }
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_embedded_schema_compiles() {
        for id in SchemaId::ALL {
            if let Err(e) = id.compile() {
                panic!("schema {} failed to compile: {}", id, e);
            }
        }
    }

    #[test]
    fn test_compiled_schema_is_shared() {
        let first = SchemaId::SlotDocument.compiled().unwrap();
        let second = SchemaId::SlotDocument.compiled().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(!std::ptr::eq(first, SchemaId::LessonBundle.compiled().unwrap()));
    }

    #[test]
    fn test_names_round_trip() {
        for id in SchemaId::ALL {
            assert_eq!(SchemaId::from_name(id.name()), Some(id));
        }
        assert_eq!(SchemaId::from_name("lesson"), None);
    }
}
