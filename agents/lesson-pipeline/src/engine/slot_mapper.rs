//! Slot mapping
//!
//! A pure join on source ids: a slot takes the content of the first block
//! (statutory) or the prompt of the first assessment (examBoard) whose
//! `sources` share at least one entry with the slot's `sources`.

use std::collections::HashSet;

use crate::contracts::*;
use crate::error::{PipelineError, Result};

/// Resolve every declared slot against the lesson structure
pub fn map_slots(lesson: &LessonStructure, contract: &SlotContract) -> Result<SlotMapping> {
    let mut seen = HashSet::new();
    let mut slots = Vec::with_capacity(contract.slots.len());

    for declaration in &contract.slots {
        if !seen.insert(declaration.slot_id.as_str()) {
            return Err(PipelineError::invalid_input(format!(
                "slot '{}' is declared more than once",
                declaration.slot_id
            )));
        }

        let content = match declaration.kind {
            SlotKind::Statutory => find_block(lesson, &declaration.sources),
            SlotKind::ExamBoard => find_assessment(lesson, &declaration.sources),
        };

        if content.is_none() {
            tracing::debug!(
                slot_id = %declaration.slot_id,
                kind = %declaration.kind,
                "no source match for slot"
            );
        }

        slots.push(MappedSlot {
            slot_id: declaration.slot_id.clone(),
            kind: declaration.kind,
            required: declaration.required,
            sources: declaration.sources.clone(),
            content: content.map(str::to_string),
        });
    }

    Ok(SlotMapping {
        version: DOCUMENT_VERSION.to_string(),
        lesson_id: lesson.lesson_id.clone(),
        slots,
        metadata: lesson.metadata,
    })
}

fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|source| b.contains(source))
}

fn find_block<'a>(lesson: &'a LessonStructure, sources: &[String]) -> Option<&'a str> {
    lesson
        .pages
        .iter()
        .flat_map(|page| &page.blocks)
        .find(|block| intersects(&block.sources, sources))
        .map(|block| block.content.as_str())
}

fn find_assessment<'a>(lesson: &'a LessonStructure, sources: &[String]) -> Option<&'a str> {
    lesson
        .assessments
        .iter()
        .find(|assessment| intersects(&assessment.sources, sources))
        .map(|assessment| assessment.prompt.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson() -> LessonStructure {
        let block = |content: &str, source: &str| Block {
            block_type: BlockType::Statutory,
            content: content.to_string(),
            sources: vec![source.to_string()],
        };
        LessonStructure {
            lesson_id: "3f1c2a9e-0000-5000-8000-000000000000".to_string(),
            subject: "Biology".to_string(),
            level: "GCSE".to_string(),
            board: "AQA".to_string(),
            spec_version: "2025".to_string(),
            topic: "photosynthesis".to_string(),
            pages: vec![
                Page {
                    page_id: "page-1".to_string(),
                    title: "photosynthesis: S1".to_string(),
                    blocks: vec![block("first", "S1")],
                },
                Page {
                    page_id: "page-2".to_string(),
                    title: "photosynthesis: S2".to_string(),
                    blocks: vec![block("second", "S2")],
                },
            ],
            assessments: vec![Assessment {
                assessment_type: AssessmentType::Mcq,
                prompt: "Explain limiting factors.".to_string(),
                sources: vec!["AQA:photosynthesis".to_string()],
            }],
            metadata: ReviewMetadata::default(),
        }
    }

    fn declare(slot_id: &str, kind: SlotKind, sources: &[&str]) -> SlotDeclaration {
        SlotDeclaration {
            slot_id: slot_id.to_string(),
            kind,
            sources: sources.iter().map(|s| s.to_string()).collect(),
            required: true,
        }
    }

    fn contract(slots: Vec<SlotDeclaration>) -> SlotContract {
        SlotContract {
            version: None,
            description: None,
            slots,
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mapping = map_slots(
            &lesson(),
            &contract(vec![declare("intro", SlotKind::Statutory, &["S2", "S1"])]),
        )
        .unwrap();
        assert_eq!(mapping.slots[0].content.as_deref(), Some("first"));
    }

    #[test]
    fn test_kinds_search_their_own_side() {
        let mapping = map_slots(
            &lesson(),
            &contract(vec![
                declare("q1", SlotKind::ExamBoard, &["AQA:photosynthesis"]),
                declare("wrong-side", SlotKind::Statutory, &["AQA:photosynthesis"]),
            ]),
        )
        .unwrap();
        assert_eq!(mapping.slots[0].content.as_deref(), Some("Explain limiting factors."));
        assert_eq!(mapping.slots[1].content, None);
    }

    #[test]
    fn test_unmatched_slot_maps_to_null() {
        let mapping = map_slots(
            &lesson(),
            &contract(vec![declare("missing", SlotKind::Statutory, &["S9"])]),
        )
        .unwrap();
        assert_eq!(mapping.slots[0].content, None);
        assert_eq!(mapping.lesson_id, lesson().lesson_id);
        assert!(!mapping.metadata.requires_review);
    }

    #[test]
    fn test_duplicate_slot_ids_are_rejected() {
        let result = map_slots(
            &lesson(),
            &contract(vec![
                declare("intro", SlotKind::Statutory, &["S1"]),
                declare("intro", SlotKind::Statutory, &["S2"]),
            ]),
        );
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }
}
