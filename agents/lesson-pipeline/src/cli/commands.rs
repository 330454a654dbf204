//! CLI command definitions for the Lesson Pipeline
//!
//! One subcommand per stage. A missing positional document means "read JSON
//! from standard input".

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use super::output::{self, OutputFormat};
use super::ExitCode;
use crate::bundle::{build_bundle, write_bundle, BundleInput};
use crate::config::RuntimeSwitches;
use crate::contracts::*;
use crate::document;
use crate::engine::{self, AssemblyInput};
use crate::error::{PipelineError, Result};
use crate::generation::{check_policy, Executor, PolicyEngine};
use crate::integrity;
use crate::provenance;
use crate::telemetry::{TelemetryEmitter, TelemetrySink};
use lesson_schema::Schema;

/// Lesson Pipeline CLI
///
/// Schema-gated stages that turn curriculum statements and exam-board
/// specifications into lesson structures, content slots and bundles.
#[derive(Parser, Debug)]
#[command(name = "lesson-pipeline")]
#[command(about = "Curriculum-to-lesson generation pipeline", long_about = None)]
#[command(version)]
pub struct LessonCli {
    /// Log verbosity on standard error (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: LessonCommands,
}

/// Runtime switches for the generative path, normally set through the
/// environment
#[derive(Args, Debug, Clone, Default)]
pub struct SwitchArgs {
    /// Feature flag for the generative path (1, true, yes, on)
    #[arg(long, env = "LESSON_AI_ENABLED", hide = true)]
    pub ai_enabled: Option<String>,

    /// Kill switch; any value but 0/false/no/off stops every service call
    #[arg(long, env = "LESSON_AI_KILL_SWITCH", hide = true)]
    pub kill_switch: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the chat-completion service
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Append telemetry as JSON lines to this file instead of standard error
    #[arg(long, env = "LESSON_TELEMETRY_PATH")]
    pub telemetry_path: Option<PathBuf>,
}

impl SwitchArgs {
    pub fn resolve(&self) -> RuntimeSwitches {
        RuntimeSwitches::resolve(
            self.ai_enabled.as_deref(),
            self.kill_switch.as_deref(),
            self.api_key.clone(),
            self.base_url.clone(),
            self.telemetry_path.clone(),
        )
    }
}

/// Available pipeline commands
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    /// Validate a document against a built-in schema or a schema file
    Validate {
        /// Built-in schema name (e.g. `board-spec`) or path to a schema file
        #[arg(short, long)]
        schema: String,

        /// Document to validate; standard input when omitted
        document: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Assemble a lesson structure from curriculum documents
    Assemble {
        /// Derivation contract naming topic, exam board and spec version
        #[arg(long)]
        contract: PathBuf,

        /// Statutory statement document
        #[arg(long)]
        statutory: PathBuf,

        /// Exam board specification
        #[arg(long)]
        board_spec: PathBuf,
    },

    /// Resolve declared slots against a lesson structure
    MapSlots {
        /// Slot contract
        #[arg(long)]
        slots: PathBuf,

        /// Lesson structure; standard input when omitted
        lesson: Option<PathBuf>,
    },

    /// Guarantee every required slot carries content
    FillSlots {
        /// Slot mapping or slot document; standard input when omitted
        mapping: Option<PathBuf>,
    },

    /// Execute a slot generation job spec
    Generate {
        /// Generation job spec; standard input when omitted
        jobs: Option<PathBuf>,

        /// Allowlist policy; without one every generate job is denied
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Slot document that verbatim jobs copy from
        #[arg(long)]
        slots: Option<PathBuf>,

        /// Executor configuration (model, sampling, limits)
        #[arg(long)]
        executor_config: Option<PathBuf>,

        /// Prompt contract
        #[arg(long)]
        prompt_contract: Option<PathBuf>,

        #[command(flatten)]
        switches: SwitchArgs,
    },

    /// Show the gate decision for every job without calling the service
    CheckPolicy {
        /// Generation job spec; standard input when omitted
        jobs: Option<PathBuf>,

        #[arg(long)]
        policy: Option<PathBuf>,

        #[command(flatten)]
        switches: SwitchArgs,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Check locked source files against their recorded digests
    VerifyIntegrity {
        /// Lock manifest
        #[arg(short, long)]
        manifest: PathBuf,

        /// Directory locked paths are relative to (default: the manifest's)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Recompute and rewrite the manifest instead of verifying
        #[arg(long)]
        relock: bool,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Fail if any generated artifact lacks a true provenance flag
    AssertProvenance {
        /// Directory to scan
        dir: PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Compare two versions of a board spec
    SpecDiff {
        old: PathBuf,
        new: PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Run every deterministic stage and emit a lesson bundle
    Bundle {
        #[arg(long)]
        contract: PathBuf,

        #[arg(long)]
        statutory: PathBuf,

        #[arg(long)]
        board_spec: PathBuf,

        /// Slot contract
        #[arg(long)]
        slots: PathBuf,

        /// Optional job spec, executed dry (generate jobs always stub)
        #[arg(long)]
        jobs: Option<PathBuf>,

        /// Also write `<lessonId>.generated.json` into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        switches: SwitchArgs,
    },
}

/// Execute the validate command
pub fn execute_validate(
    schema: &str,
    path: Option<&Path>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let user_schema: Schema;
    let (label, compiled) = match SchemaId::from_name(schema) {
        Some(id) => (id.to_string(), id.compiled()?),
        None => {
            let schema_path = Path::new(schema);
            let raw = document::read(Some(schema_path))?;
            user_schema = Schema::compile(&raw.value)?;
            (raw.label, &user_schema)
        }
    };

    let doc = document::read(path)?;
    let report = compiled.validate(&doc.value);
    output::render(&report, format)?;

    if report.valid {
        Ok(ExitCode::Success)
    } else {
        Err(PipelineError::SchemaViolation {
            document: format!("{} ({})", doc.label, label),
            report,
        })
    }
}

/// Execute the assemble command
pub fn execute_assemble(contract: &Path, statutory: &Path, board_spec: &Path) -> Result<ExitCode> {
    let input = AssemblyInput {
        contract: document::load(SchemaId::DerivationContract, Some(contract))?,
        statutory: document::load(SchemaId::StatutoryDocument, Some(statutory))?,
        board_spec: document::load(SchemaId::BoardSpec, Some(board_spec))?,
    };

    let lesson = engine::assemble(&input)?;
    output::print_json(&document::emit(SchemaId::LessonStructure, &lesson)?)?;
    Ok(ExitCode::Success)
}

/// Execute the map-slots command
pub fn execute_map_slots(slots: &Path, lesson: Option<&Path>) -> Result<ExitCode> {
    let contract: SlotContract = document::load(SchemaId::SlotContract, Some(slots))?;
    let lesson: LessonStructure = document::load(SchemaId::LessonStructure, lesson)?;

    let mapping = engine::map_slots(&lesson, &contract)?;
    output::print_json(&document::emit(SchemaId::SlotMapping, &mapping)?)?;
    Ok(ExitCode::Success)
}

/// Execute the fill-slots command
pub fn execute_fill_slots(mapping: Option<&Path>) -> Result<ExitCode> {
    let input = engine::slot_filler::decode_input(document::read(mapping)?)?;

    let filled = engine::fill_slots(&input);
    output::print_json(&document::emit(SchemaId::SlotDocument, &filled)?)?;
    Ok(ExitCode::Success)
}

/// Options of the generate command
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub jobs: Option<PathBuf>,
    pub policy: Option<PathBuf>,
    pub slots: Option<PathBuf>,
    pub executor_config: Option<PathBuf>,
    pub prompt_contract: Option<PathBuf>,
}

/// Execute the generate command
pub fn execute_generate(options: GenerateOptions, switches: RuntimeSwitches) -> Result<ExitCode> {
    let spec: GenerationJobSpec =
        document::load(SchemaId::GenerationJobSpec, options.jobs.as_deref())?;
    let policy = PolicyEngine::load(options.policy.as_deref());

    let config = match &options.executor_config {
        Some(path) => document::load(SchemaId::ExecutorConfig, Some(path))?,
        None => ExecutorConfig::default(),
    };
    let prompt = match &options.prompt_contract {
        Some(path) => document::load(SchemaId::PromptContract, Some(path))?,
        None => PromptContract::default(),
    };

    let telemetry = TelemetryEmitter::new(TelemetrySink::from_path(switches.telemetry_path.clone()));
    let mut executor = Executor::new(switches, policy, telemetry)
        .with_config(config)
        .with_prompt(prompt);
    if let Some(path) = &options.slots {
        executor = executor.with_slots(document::load(SchemaId::SlotDocument, Some(path))?);
    }

    let report = runtime()?.block_on(executor.run(&spec))?;
    output::print_json(&document::emit(SchemaId::GenerationReport, &report)?)?;
    Ok(ExitCode::Success)
}

/// Execute the check-policy command
pub fn execute_check_policy(
    jobs: Option<&Path>,
    policy: Option<&Path>,
    switches: &RuntimeSwitches,
    format: OutputFormat,
) -> Result<ExitCode> {
    let spec: GenerationJobSpec = document::load(SchemaId::GenerationJobSpec, jobs)?;
    let engine = PolicyEngine::load(policy);

    let report = check_policy(switches, &spec, &engine);
    output::render(&report, format)?;
    Ok(ExitCode::Success)
}

/// Execute the verify-integrity command
pub fn execute_verify_integrity(
    manifest_path: &Path,
    root: Option<&Path>,
    relock: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let manifest = integrity::load_manifest(manifest_path)?;
    let root = root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| integrity::default_root(manifest_path));

    if relock {
        let (relocked, report) = integrity::relock(&manifest, &root)?;
        integrity::write_manifest(manifest_path, &relocked)?;
        output::render(&report, format)?;
        return Ok(ExitCode::Success);
    }

    let report = integrity::verify(&manifest, &root);
    output::render(&report, format)?;
    report.into_result()?;
    Ok(ExitCode::Success)
}

/// Execute the assert-provenance command
pub fn execute_assert_provenance(dir: &Path, format: OutputFormat) -> Result<ExitCode> {
    let report = provenance::assert_provenance(dir)?;
    output::render(&report, format)?;
    report.into_result()?;
    Ok(ExitCode::Success)
}

/// Execute the spec-diff command
pub fn execute_spec_diff(old: &Path, new: &Path, format: OutputFormat) -> Result<ExitCode> {
    let old: BoardSpec = document::load(SchemaId::BoardSpec, Some(old))?;
    let new: BoardSpec = document::load(SchemaId::BoardSpec, Some(new))?;

    let diff = engine::diff_specs(&old, &new);
    document::emit(SchemaId::SpecDiff, &diff)?;
    output::render(&diff, format)?;
    Ok(ExitCode::Success)
}

/// Execute the bundle command
pub fn execute_bundle(
    contract: &Path,
    statutory: &Path,
    board_spec: &Path,
    slots: &Path,
    jobs: Option<&Path>,
    out_dir: Option<&Path>,
    switches: &RuntimeSwitches,
) -> Result<ExitCode> {
    let input = BundleInput {
        assembly: AssemblyInput {
            contract: document::load(SchemaId::DerivationContract, Some(contract))?,
            statutory: document::load(SchemaId::StatutoryDocument, Some(statutory))?,
            board_spec: document::load(SchemaId::BoardSpec, Some(board_spec))?,
        },
        slot_contract: document::load(SchemaId::SlotContract, Some(slots))?,
        jobs: jobs
            .map(|path| document::load(SchemaId::GenerationJobSpec, Some(path)))
            .transpose()?,
    };

    let telemetry = TelemetryEmitter::new(TelemetrySink::from_path(switches.telemetry_path.clone()));
    let bundle = runtime()?.block_on(build_bundle(&input, switches, telemetry))?;

    if let Some(dir) = out_dir {
        write_bundle(dir, &bundle)?;
    }
    output::print_json(&bundle)?;
    Ok(ExitCode::Success)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| PipelineError::Configuration(format!("async runtime: {}", e)))
}
