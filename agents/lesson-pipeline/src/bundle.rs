//! Lesson bundle
//!
//! Chains every deterministic stage in one process and wraps the results in
//! a [`LessonBundle`] that declares its own provenance. Each intermediate
//! document passes through its schema gate exactly as it would between
//! separate invocations. Generation runs dry: `generate` jobs always stub.

use std::path::{Path, PathBuf};

use crate::config::RuntimeSwitches;
use crate::contracts::*;
use crate::document;
use crate::engine::{assemble, fill_slots, map_slots, AssemblyInput};
use crate::error::{PipelineError, Result};
use crate::generation::{Executor, PolicyEngine};
use crate::provenance::ARTIFACT_SUFFIX;
use crate::telemetry::TelemetryEmitter;

/// Everything one bundle run reads
#[derive(Debug, Clone)]
pub struct BundleInput {
    pub assembly: AssemblyInput,
    pub slot_contract: SlotContract,
    pub jobs: Option<GenerationJobSpec>,
}

/// Build a bundle without contacting the generative service
pub async fn build_bundle(
    input: &BundleInput,
    switches: &RuntimeSwitches,
    telemetry: TelemetryEmitter,
) -> Result<LessonBundle> {
    let lesson = assemble(&input.assembly)?;
    document::emit(SchemaId::LessonStructure, &lesson)?;

    let mapping = map_slots(&lesson, &input.slot_contract)?;
    document::emit(SchemaId::SlotMapping, &mapping)?;

    let slots = fill_slots(&FillInput::from(mapping));
    document::emit(SchemaId::SlotDocument, &slots)?;

    let generation = match &input.jobs {
        Some(spec) => {
            let executor = Executor::new(switches.dry_run(), PolicyEngine::default_deny(), telemetry)
                .with_slots(slots.clone());
            let report = executor.run(spec).await?;
            document::emit(SchemaId::GenerationReport, &report)?;
            Some(report)
        }
        None => None,
    };

    let mut metadata = lesson.metadata;
    if slots.metadata.requires_review {
        metadata.flag();
    }
    let stubbed = generation.as_ref().map_or(false, |report| {
        report
            .results
            .iter()
            .any(|r| r.status == GenerationStatus::Stub)
    });
    if stubbed {
        metadata.flag();
    }

    let bundle = LessonBundle {
        version: DOCUMENT_VERSION.to_string(),
        lesson_id: lesson.lesson_id.clone(),
        generated_at: chrono::Utc::now(),
        ai_generated: true,
        lesson,
        slots,
        generation,
        metadata,
    };
    document::emit(SchemaId::LessonBundle, &bundle)?;

    tracing::info!(
        lesson_id = %bundle.lesson_id,
        requires_review = bundle.metadata.requires_review,
        "bundle assembled"
    );
    Ok(bundle)
}

/// Artifact file name for a bundle, matching the provenance scan
pub fn artifact_name(bundle: &LessonBundle) -> String {
    format!("{}{}", bundle.lesson_id, ARTIFACT_SUFFIX)
}

/// Write the bundle as `<lessonId>.generated.json` under `out_dir`
pub fn write_bundle(out_dir: &Path, bundle: &LessonBundle) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir).map_err(|e| {
        PipelineError::file_error(format!(
            "Failed to create '{}': {}",
            out_dir.display(),
            e
        ))
    })?;

    let path = out_dir.join(artifact_name(bundle));
    let mut json = serde_json::to_string_pretty(bundle)
        .map_err(|e| PipelineError::Serialization(e.to_string()))?;
    json.push('\n');
    std::fs::write(&path, json).map_err(|e| {
        PipelineError::file_error(format!("Failed to write '{}': {}", path.display(), e))
    })?;

    tracing::info!(file = %path.display(), "bundle written");
    Ok(path)
}
