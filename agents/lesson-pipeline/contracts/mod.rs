//! Lesson Pipeline Contract Definitions
//!
//! Typed forms of every document that crosses a stage boundary. Each stage
//! validates the raw JSON against the matching schema in [`schemas`] first,
//! then deserializes into these types; unknown tags (`kind`, `mode`,
//! `status`) fail deserialization instead of falling into a default branch.
//!
//! # Document flow
//!
//! ```text
//! DerivationContract + StatutoryDocument + BoardSpec
//!     -> LessonStructure            (assemble)
//!     -> SlotMapping                (map-slots, with a SlotContract)
//!     -> SlotDocument               (fill-slots)
//!     -> GenerationReport           (generate, with a GenerationJobSpec)
//!     -> LessonBundle               (bundle)
//! ```

pub mod curriculum;
pub mod generation;
pub mod lesson;
pub mod reports;
pub mod schemas;

pub use curriculum::{
    BoardSpec, CurriculumStatement, DerivationContract, DerivationInput, StatutoryDocument,
};
pub use generation::{
    AllowlistPolicy, AppliesTo, ExecutorConfig, GenerationJobSpec, GenerationMode,
    GenerationReport, GenerationResult, GenerationStatus, JobItem, JobMetadata, OutputTarget,
    PolicyMode, PolicyRule, PromptContract, RuleScope, TelemetryEvent, TelemetryPath,
};
pub use lesson::{
    Assessment, AssessmentType, Block, BlockType, ExamBoardSlot, FillInput, FilledSlot,
    LessonStructure, MappedSlot, Page, ReviewMetadata, SlotContract, SlotDeclaration,
    SlotDocument, SlotKind, SlotMapping, StatutorySlot, UnfilledSlot,
};
pub use reports::{ChangeRecord, ChangeType, Impact, LessonBundle, SpecDiff};
pub use schemas::SchemaId;

/// Version stamped on every document this crate emits
pub const DOCUMENT_VERSION: &str = "1.0.0";

/// Version of the executor, stamped on reports and telemetry
pub const EXECUTOR_VERSION: &str = env!("CARGO_PKG_VERSION");
