//! Source-of-truth curriculum documents
//!
//! Statutory statements and exam-board specifications are immutable inputs:
//! the pipeline reads them, hashes them, and never writes them.

use serde::{Deserialize, Serialize};

/// One authoritative curriculum requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumStatement {
    /// Stable identifier, unique within its document
    pub id: String,

    /// Statement text; must be present and non-empty before it can be cited
    #[serde(default)]
    pub text: Option<String>,

    /// Issuing authority (e.g. "DfE")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}

impl CurriculumStatement {
    /// Text usable as lesson content, if any
    pub fn citable_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// A statutory document: the full set of statements for one authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatutoryDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub statements: Vec<CurriculumStatement>,
}

/// An exam board's version-specific mapping of a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSpec {
    pub board: String,
    pub subject: String,
    pub level: String,
    pub spec_version: String,
    pub topic: String,

    /// Assessment tier (e.g. "higher"), when the board distinguishes tiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    /// Statutory statement ids this topic covers
    #[serde(rename = "mapsToDfE")]
    pub maps_to_dfe: Vec<String>,

    /// Exam-style prompts the board requires
    pub exam_requirements: Vec<String>,
}

impl BoardSpec {
    /// Board-qualified source reference used to tag assessments
    pub fn board_reference(&self) -> String {
        format!("{}:{}", self.board, self.topic)
    }
}

/// Which topic, board and spec version a lesson is derived for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationContract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub input: DerivationInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationInput {
    pub topic: String,
    pub exam_board: String,
    pub spec_version: String,
}

impl DerivationInput {
    /// Deterministic key from which the lesson id is derived
    pub fn lesson_key(&self) -> String {
        format!("{}:{}:{}", self.topic, self.exam_board, self.spec_version)
    }
}
