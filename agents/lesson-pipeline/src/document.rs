//! Document loading and schema gates
//!
//! Every stage reads its input through [`load`] and passes its output
//! through [`emit`], so no document enters or leaves a stage without
//! being checked against its schema.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

use crate::contracts::SchemaId;
use crate::error::{PipelineError, Result};
use lesson_schema::ValidationReport;

/// Label used in diagnostics for documents read from standard input
pub const STDIN_LABEL: &str = "<stdin>";

/// A parsed document together with where it came from
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub label: String,
    pub value: Value,
}

/// Read a document from `path`, or standard input when `path` is `None`
pub fn read(path: Option<&Path>) -> Result<RawDocument> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                PipelineError::file_error(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            let value = parse(path, &content)?;
            Ok(RawDocument {
                label: path.display().to_string(),
                value,
            })
        }
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content).map_err(|e| {
                PipelineError::file_error(format!("Failed to read standard input: {}", e))
            })?;
            let value = serde_json::from_str(&content).map_err(|e| {
                PipelineError::parse_error(format!("Invalid JSON on standard input: {}", e))
            })?;
            Ok(RawDocument {
                label: STDIN_LABEL.to_string(),
                value,
            })
        }
    }
}

/// Parse file content by extension; every format becomes a JSON value
pub fn parse(path: &Path, content: &str) -> Result<Value> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(content).map_err(|e| {
            PipelineError::parse_error(format!("Invalid JSON in '{}': {}", path.display(), e))
        }),
        "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| {
            PipelineError::parse_error(format!("Invalid YAML in '{}': {}", path.display(), e))
        }),
        "toml" => {
            let toml_value: toml::Value = toml::from_str(content).map_err(|e| {
                PipelineError::parse_error(format!("Invalid TOML in '{}': {}", path.display(), e))
            })?;
            serde_json::to_value(toml_value)
                .map_err(|e| PipelineError::parse_error(format!("Conversion error: {}", e)))
        }
        _ => Err(PipelineError::invalid_input(format!(
            "Unsupported file format for '{}'. Supported formats: json, yaml, yml, toml",
            path.display()
        ))),
    }
}

/// Validate a value against one of the embedded schemas
pub fn check(schema: SchemaId, value: &Value) -> Result<ValidationReport> {
    Ok(schema.compiled()?.validate(value))
}

/// Fail with a [`PipelineError::SchemaViolation`] unless `value` passes in full
pub fn gate(schema: SchemaId, label: &str, value: &Value) -> Result<()> {
    let report = check(schema, value)?;
    if report.valid {
        tracing::debug!(document = label, schema = %schema, "schema gate passed");
        Ok(())
    } else {
        tracing::debug!(
            document = label,
            schema = %schema,
            errors = report.errors.len(),
            "schema gate failed"
        );
        Err(PipelineError::SchemaViolation {
            document: format!("{} ({})", label, schema),
            report,
        })
    }
}

/// Gate a raw document, then deserialize it into its contract type
pub fn decode<T: DeserializeOwned>(schema: SchemaId, doc: RawDocument) -> Result<T> {
    gate(schema, &doc.label, &doc.value)?;
    serde_json::from_value(doc.value).map_err(|e| {
        PipelineError::parse_error(format!("'{}' does not match {}: {}", doc.label, schema, e))
    })
}

/// Read, gate and decode in one step
pub fn load<T: DeserializeOwned>(schema: SchemaId, path: Option<&Path>) -> Result<T> {
    decode(schema, read(path)?)
}

/// Serialize a stage output and gate it before it leaves the stage
pub fn emit<T: Serialize>(schema: SchemaId, output: &T) -> Result<Value> {
    let value = serde_json::to_value(output)
        .map_err(|e| PipelineError::Serialization(e.to_string()))?;
    gate(schema, &format!("output {}", schema), &value)?;
    Ok(value)
}
