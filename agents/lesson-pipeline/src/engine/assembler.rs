//! Lesson structure assembly
//!
//! Pages come from statutory statement text, assessments from board exam
//! requirements. A cited statement that is missing or has no text aborts the
//! whole assembly.

use std::collections::HashMap;
use uuid::Uuid;

use crate::contracts::*;
use crate::error::{PipelineError, Result};

/// Inputs of one assembly run
#[derive(Debug, Clone)]
pub struct AssemblyInput {
    pub contract: DerivationContract,
    pub statutory: StatutoryDocument,
    pub board_spec: BoardSpec,
}

/// Deterministic lesson id: UUIDv5 of `topic:examBoard:specVersion`
pub fn derive_lesson_id(input: &DerivationInput) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, input.lesson_key().as_bytes())
}

/// Assemble a lesson structure
pub fn assemble(input: &AssemblyInput) -> Result<LessonStructure> {
    let derivation = &input.contract.input;
    let spec = &input.board_spec;

    check_contract(derivation, spec)?;
    let index = index_statements(&input.statutory)?;

    let mut pages = Vec::with_capacity(spec.maps_to_dfe.len());
    for (position, statement_id) in spec.maps_to_dfe.iter().enumerate() {
        let statement = index.get(statement_id.as_str()).ok_or_else(|| {
            PipelineError::MissingSourceReference {
                statement_id: statement_id.clone(),
                reason: "not present in the statutory document".to_string(),
            }
        })?;
        let text = statement
            .citable_text()
            .ok_or_else(|| PipelineError::MissingSourceReference {
                statement_id: statement_id.clone(),
                reason: "statement text is empty or absent".to_string(),
            })?;

        pages.push(Page {
            page_id: format!("page-{}", position + 1),
            title: format!("{}: {}", spec.topic, statement_id),
            blocks: vec![Block {
                block_type: BlockType::Statutory,
                content: text.to_string(),
                sources: vec![statement_id.clone()],
            }],
        });
    }

    let board_reference = spec.board_reference();
    let assessments = spec
        .exam_requirements
        .iter()
        .map(|requirement| Assessment {
            assessment_type: AssessmentType::Mcq,
            prompt: requirement.clone(),
            sources: vec![board_reference.clone()],
        })
        .collect::<Vec<_>>();

    let lesson_id = derive_lesson_id(derivation);
    tracing::info!(
        lesson_id = %lesson_id,
        pages = pages.len(),
        assessments = assessments.len(),
        "assembled lesson structure"
    );

    Ok(LessonStructure {
        lesson_id: lesson_id.to_string(),
        subject: spec.subject.clone(),
        level: spec.level.clone(),
        board: spec.board.clone(),
        spec_version: spec.spec_version.clone(),
        topic: spec.topic.clone(),
        pages,
        assessments,
        metadata: ReviewMetadata::default(),
    })
}

/// The board spec must describe exactly what the derivation contract asks for
fn check_contract(derivation: &DerivationInput, spec: &BoardSpec) -> Result<()> {
    let pairs = [
        ("topic", &derivation.topic, &spec.topic),
        ("examBoard", &derivation.exam_board, &spec.board),
        ("specVersion", &derivation.spec_version, &spec.spec_version),
    ];
    let mismatches: Vec<String> = pairs
        .iter()
        .filter(|(_, wanted, found)| wanted != found)
        .map(|(field, wanted, found)| {
            format!("{} is '{}' in the contract but '{}' in the board spec", field, wanted, found)
        })
        .collect();

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::ContractMismatch(mismatches.join("; ")))
    }
}

fn index_statements(doc: &StatutoryDocument) -> Result<HashMap<&str, &CurriculumStatement>> {
    let mut index = HashMap::with_capacity(doc.statements.len());
    for statement in &doc.statements {
        if index.insert(statement.id.as_str(), statement).is_some() {
            return Err(PipelineError::invalid_input(format!(
                "statement id '{}' appears more than once in the statutory document",
                statement.id
            )));
        }
    }
    Ok(index)
}
