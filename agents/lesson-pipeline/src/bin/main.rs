//! Lesson Pipeline CLI
//!
//! # Usage
//!
//! ```bash
//! # Assemble, map and fill in one shell pipeline
//! lesson-pipeline assemble --contract contract.json --statutory dfe.json --board-spec aqa.json \
//!     | lesson-pipeline map-slots --slots slots.json \
//!     | lesson-pipeline fill-slots
//!
//! # Check locked curriculum files
//! lesson-pipeline verify-integrity --manifest curriculum.lock.json --format table
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Validation, integrity, provenance or service failure
//! - 2: Invalid command-line usage

use clap::Parser;
use lesson_pipeline::{run_cli, LessonCli};
use tracing::Level;

fn main() {
    let cli = LessonCli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Standard output carries only the stage's JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
