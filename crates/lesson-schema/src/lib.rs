//! Lesson Schema
//!
//! Strict JSON-Schema (Draft 2020-12) validation used as the gate in front
//! of, and behind, every lesson pipeline stage.
//!
//! # Design Principles
//! - Strict: keywords and formats outside the 2020-12 vocabulary fail
//!   compilation, they are never silently ignored
//! - Complete: every failed constraint is reported, not just the first
//! - Binary: a document passes in full or it does not pass
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["id"],
//!     "properties": { "id": { "type": "string", "minLength": 1 } }
//! });
//!
//! let report = lesson_schema::validate(&json!({"id": "DfE-SCI-001"}), &schema).unwrap();
//! assert!(report.valid);
//! ```

pub mod error;
pub mod report;
mod strict;

pub use error::SchemaError;
pub use report::{ValidationFinding, ValidationReport};

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, ValidationError, Validator};
use serde_json::Value;
use std::fmt;

/// A compiled, reusable schema
pub struct Schema {
    id: Option<String>,
    validator: Validator,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("id", &self.id).finish()
    }
}

impl Schema {
    /// Compile a schema document in strict mode
    pub fn compile(schema: &Value) -> Result<Self, SchemaError> {
        strict::check(schema)?;
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .should_validate_formats(true)
            .build(schema)
            .map_err(|e| SchemaError::Rejected {
                reason: e.to_string(),
            })?;
        Ok(Self {
            id: schema.get("$id").and_then(Value::as_str).map(str::to_string),
            validator,
        })
    }

    /// The schema's `$id`, when declared
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Validate a document, collecting every finding
    pub fn validate(&self, document: &Value) -> ValidationReport {
        let findings = self
            .validator
            .iter_errors(document)
            .map(|err| finding(document, &err))
            .collect();
        ValidationReport::from_findings(findings)
    }

    /// Convenience: `true` when the document passes
    pub fn is_valid(&self, document: &Value) -> bool {
        self.validator.is_valid(document)
    }
}

fn finding(document: &Value, err: &ValidationError<'_>) -> ValidationFinding {
    let keyword = match &err.kind {
        ValidationErrorKind::FalseSchema => "false".to_string(),
        _ => keyword_of(&err.schema_path.to_string()),
    };
    ValidationFinding::new(
        document_path(document, &err.instance_path.to_string()),
        keyword,
        err.to_string(),
    )
}

/// The innermost vocabulary keyword on a schema pointer
///
/// `/dependentRequired/board` names `dependentRequired`, not the property.
fn keyword_of(schema_path: &str) -> String {
    let segments: Vec<&str> = schema_path.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .iter()
        .rev()
        .find(|segment| strict::is_keyword(segment))
        .or_else(|| segments.last())
        .map(|segment| segment.to_string())
        .unwrap_or_default()
}

/// Render an instance JSON pointer as `$.pages[0].title`
///
/// The document is walked alongside the pointer so numeric object keys
/// stay members and only array positions become indices.
fn document_path(document: &Value, pointer: &str) -> String {
    let mut path = String::from("$");
    let mut current = Some(document);
    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        current = match current {
            Some(Value::Array(items)) => {
                path.push('[');
                path.push_str(&segment);
                path.push(']');
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            other => {
                path.push('.');
                path.push_str(&segment);
                other.and_then(|value| value.get(segment.as_str()))
            }
        };
    }
    path
}

/// Compile `schema` and validate `document` against it in one step
pub fn validate(document: &Value, schema: &Value) -> Result<ValidationReport, SchemaError> {
    Ok(Schema::compile(schema)?.validate(document))
}
