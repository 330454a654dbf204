//! Lesson Pipeline
//!
//! Turns immutable statutory curriculum statements and exam-board
//! specifications into validated lesson structures, content slots and
//! lesson bundles, while keeping ungoverned generative content out.
//!
//! ## Architecture
//!
//! Every stage is a single-shot process: read one document, compute, write
//! one document. Inputs and outputs are both checked against the embedded
//! JSON Schemas, so a bad document is attributed to exactly one stage.
//!
//! 1. **Contracts** (`contracts/`): typed documents and their schemas.
//! 2. **Engine** (`engine/`): assembler, slot mapper, slot filler, spec diff.
//! 3. **Generation** (`generation/`): allowlist gates, service client and
//!    the slot generation executor.
//! 4. **Telemetry** (`telemetry/`): one best-effort event per job.
//! 5. **Integrity** and **Provenance**: build-time guards over locked
//!    source files and generated artifacts.
//! 6. **CLI** (`cli/`): one subcommand per stage.
//!
//! ## CLI Usage
//!
//! ```bash
//! lesson-pipeline assemble --contract contract.json --statutory dfe.json --board-spec aqa.json \
//!     | lesson-pipeline map-slots --slots slots.json \
//!     | lesson-pipeline fill-slots
//!
//! LESSON_AI_ENABLED=1 lesson-pipeline generate jobs.json --policy allowlist.yaml
//! lesson-pipeline verify-integrity --manifest curriculum.lock.json
//! lesson-pipeline assert-provenance build/
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use lesson_pipeline::{contracts::SlotContract, engine::map_slots, document};
//! use lesson_pipeline::contracts::{LessonStructure, SchemaId};
//! use std::path::Path;
//!
//! fn main() -> lesson_pipeline::Result<()> {
//!     let lesson: LessonStructure =
//!         document::load(SchemaId::LessonStructure, Some(Path::new("lesson.json")))?;
//!     let contract: SlotContract =
//!         document::load(SchemaId::SlotContract, Some(Path::new("slots.json")))?;
//!     let mapping = map_slots(&lesson, &contract)?;
//!     println!("{}", document::emit(SchemaId::SlotMapping, &mapping)?);
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod cli;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod generation;
pub mod integrity;
pub mod provenance;
pub mod telemetry;

// Contracts module - located at ../contracts relative to src/
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use bundle::{build_bundle, write_bundle, BundleInput};
pub use cli::{ExitCode, LessonCli, LessonCommands, OutputFormat};
pub use config::RuntimeSwitches;
pub use error::{PipelineError, Result, ServiceCallError};
pub use generation::{DenyReason, Executor, GateDecision, PolicyEngine};
pub use integrity::{IntegrityReport, LockManifest};
pub use provenance::ProvenanceReport;
pub use telemetry::{TelemetryEmitter, TelemetryError, TelemetrySink};

/// Run the CLI application
///
/// This is the main entry point for the CLI binary. Any error is printed
/// to standard error and mapped to exit code 1.
pub fn run_cli(cli: LessonCli) -> ExitCode {
    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::Failure
        }
    }
}
