//! Slot filling
//!
//! Guarantees that every required slot carries its kind-specific field
//! (`content` for statutory, `prompt` for examBoard). Absent text is replaced
//! by a deterministic placeholder and the document is flagged for review.

use crate::contracts::*;
use crate::document::{self, RawDocument};
use crate::error::{PipelineError, Result};

/// Deterministic placeholder for a required slot with no usable text
pub fn placeholder(kind: SlotKind, slot_id: &str) -> String {
    match kind {
        SlotKind::Statutory => format!("TODO: missing statutory content for {}", slot_id),
        SlotKind::ExamBoard => format!("TODO: missing examBoard prompt for {}", slot_id),
    }
}

/// Accept either a slot mapping or an already-filled slot document
pub fn decode_input(doc: RawDocument) -> Result<FillInput> {
    let mapping = document::check(SchemaId::SlotMapping, &doc.value)?;
    if !mapping.valid {
        let filled = document::check(SchemaId::SlotDocument, &doc.value)?;
        if !filled.valid {
            // Report against whichever shape the document is closest to
            let report = if filled.errors.len() < mapping.errors.len() {
                filled
            } else {
                mapping
            };
            return Err(PipelineError::SchemaViolation {
                document: format!("{} (slot-mapping or slot-document)", doc.label),
                report,
            });
        }
    }

    serde_json::from_value(doc.value)
        .map_err(|e| PipelineError::parse_error(format!("'{}': {}", doc.label, e)))
}

fn usable(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|t| !t.trim().is_empty())
}

/// Fill every required slot
pub fn fill_slots(input: &FillInput) -> SlotDocument {
    let mut metadata = input.metadata;
    let mut slots = Vec::with_capacity(input.slots.len());

    for slot in &input.slots {
        let text = match slot.kind {
            SlotKind::Statutory => usable(&slot.content),
            SlotKind::ExamBoard => usable(&slot.prompt).or_else(|| usable(&slot.content)),
        };

        let text = match text {
            Some(text) => Some(text.to_string()),
            None if slot.required => {
                tracing::info!(slot_id = %slot.slot_id, kind = %slot.kind, "inserting placeholder");
                metadata.flag();
                Some(placeholder(slot.kind, &slot.slot_id))
            }
            None => None,
        };

        slots.push(match slot.kind {
            SlotKind::Statutory => FilledSlot::Statutory(StatutorySlot {
                slot_id: slot.slot_id.clone(),
                required: slot.required,
                sources: slot.sources.clone(),
                content: text,
            }),
            SlotKind::ExamBoard => FilledSlot::ExamBoard(ExamBoardSlot {
                slot_id: slot.slot_id.clone(),
                required: slot.required,
                sources: slot.sources.clone(),
                prompt: text,
            }),
        });
    }

    SlotDocument {
        version: DOCUMENT_VERSION.to_string(),
        lesson_id: input.lesson_id.clone(),
        slots,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slot(slot_id: &str, kind: SlotKind, required: bool, content: Option<&str>) -> UnfilledSlot {
        UnfilledSlot {
            slot_id: slot_id.to_string(),
            kind,
            required,
            sources: vec![],
            content: content.map(str::to_string),
            prompt: None,
        }
    }

    fn input(slots: Vec<UnfilledSlot>) -> FillInput {
        FillInput {
            version: "1.0.0".to_string(),
            lesson_id: "lesson-1".to_string(),
            slots,
            metadata: ReviewMetadata::default(),
        }
    }

    #[test]
    fn test_complete_mapping_is_not_flagged() {
        let doc = fill_slots(&input(vec![
            slot("intro", SlotKind::Statutory, true, Some("Plants make glucose.")),
            slot("q1", SlotKind::ExamBoard, true, Some("Explain.")),
        ]));
        assert!(!doc.metadata.requires_review);
        assert_eq!(doc.slot("q1").and_then(FilledSlot::text), Some("Explain."));
        assert_eq!(doc.slot("q1").map(FilledSlot::kind), Some(SlotKind::ExamBoard));
    }

    #[test]
    fn test_missing_required_content_gets_placeholder() {
        let doc = fill_slots(&input(vec![
            slot("intro", SlotKind::Statutory, true, None),
            slot("q1", SlotKind::ExamBoard, true, Some("   ")),
        ]));
        assert!(doc.metadata.requires_review);
        assert_eq!(
            doc.slot("intro").and_then(FilledSlot::text),
            Some("TODO: missing statutory content for intro")
        );
        assert_eq!(
            doc.slot("q1").and_then(FilledSlot::text),
            Some("TODO: missing examBoard prompt for q1")
        );
    }

    #[test]
    fn test_optional_slots_are_left_alone() {
        let doc = fill_slots(&input(vec![slot("extra", SlotKind::Statutory, false, None)]));
        assert!(!doc.metadata.requires_review);
        assert_eq!(doc.slot("extra").and_then(FilledSlot::text), None);
    }

    #[test]
    fn test_review_flag_is_never_cleared() {
        let mut flagged = input(vec![slot("intro", SlotKind::Statutory, true, Some("text"))]);
        flagged.metadata.flag();
        assert!(fill_slots(&flagged).metadata.requires_review);
    }

    #[test]
    fn test_accepts_filled_documents() {
        let doc = RawDocument {
            label: "slots.json".to_string(),
            value: json!({
                "version": "1.0.0",
                "lessonId": "lesson-1",
                "slots": [
                    {"slotId": "q1", "kind": "examBoard", "required": true, "sources": [], "prompt": "Explain."}
                ],
                "metadata": {"requiresReview": false}
            }),
        };
        let input = decode_input(doc).unwrap();
        assert_eq!(input.slots[0].prompt.as_deref(), Some("Explain."));
        let filled = fill_slots(&input);
        assert_eq!(filled.slot("q1").and_then(FilledSlot::text), Some("Explain."));
    }

    #[test]
    fn test_rejects_documents_matching_neither_shape() {
        let doc = RawDocument {
            label: "slots.json".to_string(),
            value: json!({"version": "1.0.0", "lessonId": "lesson-1", "slots": [{"slotId": "q1"}]}),
        };
        assert!(matches!(
            decode_input(doc),
            Err(PipelineError::SchemaViolation { .. })
        ));
    }
}
