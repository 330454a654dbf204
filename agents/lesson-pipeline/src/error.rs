//! Error types for the Lesson Pipeline
//!
//! Every fatal condition a stage can hit. Policy denials are not errors: they
//! are [`GateDecision`](crate::generation::GateDecision) values that
//! downgrade a job to STUB.

use lesson_schema::{SchemaError, ValidationReport};
use thiserror::Error;

/// Main error type for pipeline stages
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A document failed its schema gate
    #[error("{document} failed schema validation:\n{}", .report.diagnostic())]
    SchemaViolation {
        document: String,
        report: ValidationReport,
    },

    /// A schema could not be compiled (strict mode)
    #[error("Schema configuration error: {0}")]
    SchemaConfiguration(#[from] SchemaError),

    /// The assembler was asked to cite a statement that does not exist or has no text
    #[error("Missing source reference '{statement_id}': {reason}")]
    MissingSourceReference {
        statement_id: String,
        reason: String,
    },

    /// Input documents describe different topics, boards or versions
    #[error("Contract mismatch: {0}")]
    ContractMismatch(String),

    /// One or more locked files changed or disappeared
    #[error("Integrity check failed with {} violation(s):\n{}", .violations.len(), bullet_list(.violations))]
    IntegrityMismatch { violations: Vec<String> },

    /// The generative service call failed
    #[error("Service call failed [{}]: {0}", .0.code())]
    ServiceCall(#[from] ServiceCallError),

    /// Generated artifacts without a true provenance flag
    #[error("Provenance check failed for {} file(s):\n{}", .files.len(), bullet_list(.files))]
    ProvenanceViolation { files: Vec<String> },

    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    File(String),

    /// Document parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Bad runtime or executor configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        PipelineError::InvalidInput(msg.into())
    }

    pub fn file_error(msg: impl Into<String>) -> Self {
        PipelineError::File(msg.into())
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        PipelineError::Parse(msg.into())
    }

    /// Stable code for service failures, used as the telemetry `errorCode`
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            PipelineError::ServiceCall(e) => Some(e.code()),
            _ => None,
        }
    }
}

/// Failures talking to the generative service, one code per cause
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceCallError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service responded with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("response body is not JSON: {0}")]
    ResponseNotJson(String),

    #[error("response has no choices[0].message.content string")]
    MissingContent,

    #[error("message content is not JSON: {0}")]
    ContentNotJson(String),

    #[error("message content is a JSON {found}, expected an object")]
    OutputNotObject { found: &'static str },
}

impl ServiceCallError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceCallError::MissingApiKey => "OPENAI_MISSING_API_KEY",
            ServiceCallError::Transport(_) => "OPENAI_TRANSPORT_ERROR",
            ServiceCallError::HttpStatus { .. } => "OPENAI_HTTP_STATUS",
            ServiceCallError::ResponseNotJson(_) => "OPENAI_RESPONSE_NOT_JSON",
            ServiceCallError::MissingContent => "OPENAI_MISSING_CONTENT",
            ServiceCallError::ContentNotJson(_) => "OPENAI_CONTENT_NOT_JSON",
            ServiceCallError::OutputNotObject { .. } => "OPENAI_OUTPUT_NOT_OBJECT",
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::File(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        PipelineError::Parse(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        PipelineError::Parse(format!("TOML error: {}", err))
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
