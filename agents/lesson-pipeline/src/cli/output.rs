//! Output formatting for the Lesson Pipeline CLI
//!
//! Stage documents are always printed as JSON. Reports can also be printed
//! as YAML or as a colored table for people reading a terminal.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use crate::contracts::SpecDiff;
use crate::error::{PipelineError, Result};
use crate::generation::PolicyCheckReport;
use crate::integrity::{IntegrityReport, RelockReport, ViolationKind};
use crate::provenance::ProvenanceReport;
use lesson_schema::ValidationReport;

/// Output format options for report commands
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// JSON format for machine processing
    #[default]
    Json,
    /// YAML format
    Yaml,
    /// Human-readable table format with colors
    Table,
}

/// Reports that know how to print themselves as a table
pub trait TableView {
    fn write_table(&self, out: &mut dyn Write);
}

/// Print a report in the requested format
pub fn render<T: Serialize + TableView>(report: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(report)
                .map_err(|e| PipelineError::Serialization(e.to_string()))?;
            print!("{}", yaml);
            Ok(())
        }
        OutputFormat::Table => {
            let mut stdout = io::stdout().lock();
            report.write_table(&mut stdout);
            Ok(())
        }
    }
}

/// Print a document as pretty JSON on standard output
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn header(out: &mut dyn Write, title: &str) {
    writeln!(out).ok();
    writeln!(out, "{}", title.cyan().bold()).ok();
    writeln!(out, "{}", "=".repeat(60)).ok();
}

fn status_line(out: &mut dyn Write, passed: bool, summary: &str) {
    let icon = if passed { "+".green() } else { "x".red() };
    writeln!(out, "{} {}", icon, summary).ok();
}

impl TableView for ValidationReport {
    fn write_table(&self, out: &mut dyn Write) {
        header(out, "Schema Validation");
        if self.valid {
            status_line(out, true, "Document is valid");
            return;
        }
        status_line(
            out,
            false,
            &format!("Document has {} error(s)", self.errors.len()),
        );
        writeln!(out, "{}", "-".repeat(60)).ok();
        for error in &self.errors {
            writeln!(
                out,
                "  {} {} {}",
                error.path.bold(),
                format!("[{}]", error.keyword).dimmed(),
                error.message
            )
            .ok();
        }
    }
}

impl TableView for IntegrityReport {
    fn write_table(&self, out: &mut dyn Write) {
        header(out, "Integrity Check");
        writeln!(out, "Algorithm: {}", self.algorithm.name()).ok();
        writeln!(out, "Checked:   {}", self.checked).ok();
        writeln!(out).ok();
        if self.passed {
            status_line(out, true, "All locked files match");
            return;
        }
        status_line(
            out,
            false,
            &format!("{} violation(s)", self.violations.len()),
        );
        for violation in &self.violations {
            let label = match &violation.kind {
                ViolationKind::Missing => "MISSING".red(),
                ViolationKind::Mismatch { .. } => "MISMATCH".red(),
                ViolationKind::Unreadable { .. } => "UNREADABLE".yellow(),
            };
            writeln!(out, "  {:<12} {}", label, violation.path).ok();
            if let ViolationKind::Mismatch { expected, actual } = &violation.kind {
                writeln!(out, "    {} {}", "expected:".dimmed(), expected).ok();
                writeln!(out, "    {} {}", "actual:  ".dimmed(), actual).ok();
            }
        }
    }
}

impl TableView for RelockReport {
    fn write_table(&self, out: &mut dyn Write) {
        header(out, "Manifest Re-lock");
        writeln!(out, "Algorithm: {}", self.algorithm.name()).ok();
        writeln!(out, "Unchanged: {}", self.unchanged).ok();
        for path in &self.updated {
            writeln!(out, "  {} {}", "updated".green(), path).ok();
        }
        for path in &self.missing {
            writeln!(out, "  {} {} (digest kept)", "missing".yellow(), path).ok();
        }
    }
}

impl TableView for ProvenanceReport {
    fn write_table(&self, out: &mut dyn Write) {
        header(out, "Provenance Check");
        writeln!(out, "Root:    {}", self.root).ok();
        writeln!(out, "Scanned: {}", self.scanned).ok();
        writeln!(out).ok();
        if self.passed {
            status_line(out, true, "Every artifact declares its provenance");
            return;
        }
        status_line(
            out,
            false,
            &format!("{} artifact(s) failed", self.violations.len()),
        );
        for finding in &self.violations {
            writeln!(out, "  {} {}: {}", "x".red(), finding.file, finding.reason).ok();
        }
    }
}

impl TableView for SpecDiff {
    fn write_table(&self, out: &mut dyn Write) {
        header(
            out,
            &format!("{} / {}: {} -> {}", self.board, self.topic, self.from_version, self.to_version),
        );
        if self.changes.is_empty() {
            writeln!(out, "No changes").ok();
            return;
        }
        writeln!(out, "{:<22} {:<20} {}", "CHANGE", "IMPACT", "DETAIL").ok();
        writeln!(out, "{}", "-".repeat(60)).ok();
        for change in &self.changes {
            writeln!(
                out,
                "{:<22} {:<20} {}",
                change.change_type.as_str().yellow(),
                change.impact.as_str(),
                change.detail
            )
            .ok();
        }
    }
}

impl TableView for PolicyCheckReport {
    fn write_table(&self, out: &mut dyn Write) {
        header(out, &format!("Generation Gates: {}", self.job_id));
        writeln!(out, "{:<16} {:<16} {:<8} {}", "JOB", "SLOT", "ALLOWED", "REASON").ok();
        writeln!(out, "{}", "-".repeat(60)).ok();
        for decision in &self.decisions {
            let allowed = if decision.allowed {
                "yes".green()
            } else {
                "no".red()
            };
            let reason = decision.reason.map(|r| r.code()).unwrap_or("-");
            writeln!(
                out,
                "{:<16} {:<16} {:<8} {}",
                decision.job_id, decision.slot_id, allowed, reason
            )
            .ok();
        }
    }
}
