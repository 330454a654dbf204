//! Slot generation contracts
//!
//! Job specifications, the allowlist policy, executor results and the
//! telemetry event written once per job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lesson::SlotKind;

/// Curriculum context a job spec (or a policy rule) applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliesTo {
    pub subject: String,
    pub level: String,
    pub board: String,
    pub spec_version: String,
}

/// How a job obtains its terminal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Copy existing slot content unchanged
    Verbatim,
    /// Ask the generative service, subject to every gate
    Generate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub field: String,
}

/// One slot that needs a value written into `output.field`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobItem {
    pub job_id: String,
    pub slot_id: String,
    pub kind: SlotKind,
    pub mode: GenerationMode,
    pub output: OutputTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(rename = "allowAI", default, skip_serializing_if = "Option::is_none")]
    pub allow_ai: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJobSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub job_id: String,
    pub applies_to: AppliesTo,
    pub jobs: Vec<JobItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JobMetadata>,
}

impl GenerationJobSpec {
    /// `true` only when the job spec explicitly opts in with `allowAI: true`
    pub fn allows_ai(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.allow_ai)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    DenyByDefault,
}

/// Set-membership filters of one allowlist rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleScope {
    pub subject: Vec<String>,
    pub level: Vec<String>,
    pub board: Vec<String>,
    pub spec_version: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub enabled: bool,
    pub applies_to: RuleScope,

    /// When present, restricts the rule to these slot kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<SlotKind>>,

    /// When present, restricts the rule to these slot ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_ids: Option<Vec<String>>,
}

/// Deny-by-default allowlist for generative slot content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowlistPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub enabled: bool,
    pub mode: PolicyMode,
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    Stub,
    Completed,
    Failed,
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStatus::Stub => write!(f, "STUB"),
            GenerationStatus::Completed => write!(f, "COMPLETED"),
            GenerationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Terminal value of one job
///
/// `output` is `None` for STUB and always a JSON object for COMPLETED; use
/// the constructors to keep that pairing. A FAILED job aborts the run, so it
/// only ever shows up in telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub version: String,
    pub job_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,

    pub status: GenerationStatus,
    pub generated_at: DateTime<Utc>,
    pub output: Option<Map<String, Value>>,
}

impl GenerationResult {
    pub fn stub(job: &JobItem) -> Self {
        Self::new(job, GenerationStatus::Stub, None)
    }

    pub fn completed(job: &JobItem, output: Map<String, Value>) -> Self {
        Self::new(job, GenerationStatus::Completed, Some(output))
    }

    fn new(job: &JobItem, status: GenerationStatus, output: Option<Map<String, Value>>) -> Self {
        Self {
            version: super::DOCUMENT_VERSION.to_string(),
            job_id: job.job_id.clone(),
            slot_id: Some(job.slot_id.clone()),
            status,
            generated_at: Utc::now(),
            output,
        }
    }
}

/// Everything one executor run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub version: String,
    pub executor_version: String,
    pub job_id: String,
    pub applies_to: AppliesTo,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<GenerationResult>,
}

/// Decision path a job took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryPath {
    Stub,
    Openai,
    /// Source text copied by a verbatim-mode job; the telemetry schema
    /// lists it beside `stub` and `openai`
    Verbatim,
}

impl TelemetryPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryPath::Stub => "stub",
            TelemetryPath::Openai => "openai",
            TelemetryPath::Verbatim => "verbatim",
        }
    }
}

/// Written exactly once per job execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub version: String,
    pub executor_version: String,
    pub job_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,

    pub path: TelemetryPath,
    pub status: GenerationStatus,
    pub latency_ms: u64,
    pub error_code: Option<String>,
}

/// Versioned generative service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    pub version: String,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            top_p: 1.0,
            max_tokens: 800,
            timeout_ms: 30_000,
        }
    }
}

/// Versioned system prompt and instructions sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptContract {
    pub version: String,
    pub system: String,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Default for PromptContract {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            system: "You generate curriculum-aligned lesson slot content. \
                     Respond with a single JSON object and nothing else."
                .to_string(),
            instructions: vec![
                "Use only the curriculum context supplied in the job specification.".to_string(),
                "Write the value for the requested output field as a key of the JSON object."
                    .to_string(),
                "Do not wrap the JSON in markdown fences.".to_string(),
            ],
        }
    }
}
