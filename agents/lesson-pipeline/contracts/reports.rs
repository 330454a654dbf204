//! Terminal artifacts: spec-diff reports and lesson bundles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generation::GenerationReport;
use super::lesson::{LessonStructure, ReviewMetadata, SlotDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    RequirementAdded,
    RequirementRemoved,
    MappingAdded,
    MappingRemoved,
    TierChanged,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::RequirementAdded => "requirement_added",
            ChangeType::RequirementRemoved => "requirement_removed",
            ChangeType::MappingAdded => "mapping_added",
            ChangeType::MappingRemoved => "mapping_removed",
            ChangeType::TierChanged => "tier_changed",
        }
    }

    /// Which part of the lesson a change of this type affects
    pub fn impact(&self) -> Impact {
        match self {
            ChangeType::RequirementAdded | ChangeType::RequirementRemoved => Impact::LessonContent,
            ChangeType::MappingAdded | ChangeType::MappingRemoved => Impact::StatutoryCoverage,
            ChangeType::TierChanged => Impact::Assessment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    LessonContent,
    StatutoryCoverage,
    Assessment,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::LessonContent => "lesson_content",
            Impact::StatutoryCoverage => "statutory_coverage",
            Impact::Assessment => "assessment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub change_type: ChangeType,
    pub detail: String,
    pub impact: Impact,
}

impl ChangeRecord {
    pub fn new(change_type: ChangeType, detail: impl Into<String>) -> Self {
        Self {
            change_type,
            detail: detail.into(),
            impact: change_type.impact(),
        }
    }
}

/// Changes between two versions of one board spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDiff {
    pub topic: String,
    pub board: String,
    pub from_version: String,
    pub to_version: String,
    pub changes: Vec<ChangeRecord>,
}

/// A complete generated lesson, self-declaring its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonBundle {
    pub version: String,
    pub lesson_id: String,
    pub generated_at: DateTime<Utc>,
    pub ai_generated: bool,
    pub lesson: LessonStructure,
    pub slots: SlotDocument,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationReport>,

    pub metadata: ReviewMetadata,
}
