//! Lesson and slot documents
//!
//! Each document here is produced by exactly one stage and is read-only for
//! every stage after it.

use serde::{Deserialize, Serialize};

/// Review flag carried forward through every document
///
/// Starts false; any stage that guesses or placeholders content forces it
/// true and no later stage may clear it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetadata {
    pub requires_review: bool,
}

impl ReviewMetadata {
    /// Raise the flag; never lowers it
    pub fn flag(&mut self) {
        self.requires_review = true;
    }
}

/// Block types a page may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Statutory,
}

/// Assessment item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssessmentType {
    Mcq,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_id: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    pub prompt: String,
    pub sources: Vec<String>,
}

/// Assembled lesson: one page per mapped statement, one assessment per
/// board exam requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStructure {
    pub lesson_id: String,
    pub subject: String,
    pub level: String,
    pub board: String,
    pub spec_version: String,
    pub topic: String,
    pub pages: Vec<Page>,
    pub assessments: Vec<Assessment>,
    pub metadata: ReviewMetadata,
}

/// Kind of content a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotKind {
    Statutory,
    ExamBoard,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Statutory => "statutory",
            SlotKind::ExamBoard => "examBoard",
        }
    }
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot declaration, independent of any one lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDeclaration {
    pub slot_id: String,
    pub kind: SlotKind,
    pub sources: Vec<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotContract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub slots: Vec<SlotDeclaration>,
}

/// One slot after the join against a lesson structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedSlot {
    pub slot_id: String,
    pub kind: SlotKind,
    pub required: bool,
    pub sources: Vec<String>,
    /// Matched block content or assessment prompt; `None` when unmatched
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotMapping {
    pub version: String,
    pub lesson_id: String,
    pub slots: Vec<MappedSlot>,
    pub metadata: ReviewMetadata,
}

/// Loose slot shape accepted by the filler: a mapping entry or an
/// already-filled entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfilledSlot {
    pub slot_id: String,
    pub kind: SlotKind,
    pub required: bool,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Filler input: a [`SlotMapping`] or a [`SlotDocument`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInput {
    pub version: String,
    pub lesson_id: String,
    pub slots: Vec<UnfilledSlot>,
    pub metadata: ReviewMetadata,
}

impl From<SlotMapping> for FillInput {
    fn from(mapping: SlotMapping) -> Self {
        Self {
            version: mapping.version,
            lesson_id: mapping.lesson_id,
            slots: mapping
                .slots
                .into_iter()
                .map(|slot| UnfilledSlot {
                    slot_id: slot.slot_id,
                    kind: slot.kind,
                    required: slot.required,
                    sources: slot.sources,
                    content: slot.content,
                    prompt: None,
                })
                .collect(),
            metadata: mapping.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatutorySlot {
    pub slot_id: String,
    pub required: bool,
    pub sources: Vec<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamBoardSlot {
    pub slot_id: String,
    pub required: bool,
    pub sources: Vec<String>,
    pub prompt: Option<String>,
}

/// A filled slot, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FilledSlot {
    #[serde(rename = "statutory")]
    Statutory(StatutorySlot),
    #[serde(rename = "examBoard")]
    ExamBoard(ExamBoardSlot),
}

impl FilledSlot {
    pub fn slot_id(&self) -> &str {
        match self {
            FilledSlot::Statutory(slot) => &slot.slot_id,
            FilledSlot::ExamBoard(slot) => &slot.slot_id,
        }
    }

    pub fn kind(&self) -> SlotKind {
        match self {
            FilledSlot::Statutory(_) => SlotKind::Statutory,
            FilledSlot::ExamBoard(_) => SlotKind::ExamBoard,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            FilledSlot::Statutory(slot) => slot.required,
            FilledSlot::ExamBoard(slot) => slot.required,
        }
    }

    /// The kind-specific minimally-shaped field (`content` or `prompt`)
    pub fn text(&self) -> Option<&str> {
        match self {
            FilledSlot::Statutory(slot) => slot.content.as_deref(),
            FilledSlot::ExamBoard(slot) => slot.prompt.as_deref(),
        }
    }
}

/// Post-fill document: every required slot carries its minimal field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDocument {
    pub version: String,
    pub lesson_id: String,
    pub slots: Vec<FilledSlot>,
    pub metadata: ReviewMetadata,
}

impl SlotDocument {
    pub fn slot(&self, slot_id: &str) -> Option<&FilledSlot> {
        self.slots.iter().find(|s| s.slot_id() == slot_id)
    }
}
