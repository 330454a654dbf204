//! CLI module for the Lesson Pipeline
//!
//! Every subcommand is an independent single-shot process: documents on
//! standard output, diagnostics on standard error, exit code 0 or 1.

pub mod commands;
pub mod output;

pub use commands::{LessonCli, LessonCommands, SwitchArgs};
pub use output::OutputFormat;

use crate::error::PipelineError;
use commands::GenerateOptions;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The stage produced its output
    Success = 0,
    /// Any validation, integrity, provenance or service failure
    Failure = 1,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Run the CLI with the given arguments and return the exit code
pub fn run(cli: LessonCli) -> Result<ExitCode, PipelineError> {
    match cli.command {
        LessonCommands::Validate {
            schema,
            document,
            format,
        } => commands::execute_validate(&schema, document.as_deref(), format),
        LessonCommands::Assemble {
            contract,
            statutory,
            board_spec,
        } => commands::execute_assemble(&contract, &statutory, &board_spec),
        LessonCommands::MapSlots { slots, lesson } => {
            commands::execute_map_slots(&slots, lesson.as_deref())
        }
        LessonCommands::FillSlots { mapping } => commands::execute_fill_slots(mapping.as_deref()),
        LessonCommands::Generate {
            jobs,
            policy,
            slots,
            executor_config,
            prompt_contract,
            switches,
        } => commands::execute_generate(
            GenerateOptions {
                jobs,
                policy,
                slots,
                executor_config,
                prompt_contract,
            },
            switches.resolve(),
        ),
        LessonCommands::CheckPolicy {
            jobs,
            policy,
            switches,
            format,
        } => commands::execute_check_policy(
            jobs.as_deref(),
            policy.as_deref(),
            &switches.resolve(),
            format,
        ),
        LessonCommands::VerifyIntegrity {
            manifest,
            root,
            relock,
            format,
        } => commands::execute_verify_integrity(&manifest, root.as_deref(), relock, format),
        LessonCommands::AssertProvenance { dir, format } => {
            commands::execute_assert_provenance(&dir, format)
        }
        LessonCommands::SpecDiff { old, new, format } => {
            commands::execute_spec_diff(&old, &new, format)
        }
        LessonCommands::Bundle {
            contract,
            statutory,
            board_spec,
            slots,
            jobs,
            out_dir,
            switches,
        } => commands::execute_bundle(
            &contract,
            &statutory,
            &board_spec,
            &slots,
            jobs.as_deref(),
            out_dir.as_deref(),
            &switches.resolve(),
        ),
    }
}
