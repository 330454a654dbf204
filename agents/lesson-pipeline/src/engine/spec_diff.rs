//! Board spec version diffs
//!
//! Set differences on `examRequirements` and `mapsToDfE` plus an equality
//! check on `tier`. Removed entries follow the old list's order, added
//! entries the new list's.

use crate::contracts::{BoardSpec, ChangeRecord, ChangeType, SpecDiff};

/// Compare two versions of a board spec
pub fn diff_specs(old: &BoardSpec, new: &BoardSpec) -> SpecDiff {
    if old.topic != new.topic || old.board != new.board {
        tracing::warn!(
            old_topic = %old.topic,
            new_topic = %new.topic,
            old_board = %old.board,
            new_board = %new.board,
            "diffing specs for different topics or boards"
        );
    }

    let mut changes = Vec::new();

    set_changes(
        &old.exam_requirements,
        &new.exam_requirements,
        ChangeType::RequirementRemoved,
        ChangeType::RequirementAdded,
        &mut changes,
    );
    set_changes(
        &old.maps_to_dfe,
        &new.maps_to_dfe,
        ChangeType::MappingRemoved,
        ChangeType::MappingAdded,
        &mut changes,
    );

    if old.tier != new.tier {
        changes.push(ChangeRecord::new(
            ChangeType::TierChanged,
            format!("{} -> {}", tier_label(&old.tier), tier_label(&new.tier)),
        ));
    }

    SpecDiff {
        topic: new.topic.clone(),
        board: new.board.clone(),
        from_version: old.spec_version.clone(),
        to_version: new.spec_version.clone(),
        changes,
    }
}

fn set_changes(
    old: &[String],
    new: &[String],
    removed: ChangeType,
    added: ChangeType,
    out: &mut Vec<ChangeRecord>,
) {
    let mut reported: Vec<&String> = Vec::new();
    for item in old.iter().filter(|item| !new.contains(item)) {
        if !reported.contains(&item) {
            reported.push(item);
            out.push(ChangeRecord::new(removed, item.clone()));
        }
    }
    reported.clear();
    for item in new.iter().filter(|item| !old.contains(item)) {
        if !reported.contains(&item) {
            reported.push(item);
            out.push(ChangeRecord::new(added, item.clone()));
        }
    }
}

fn tier_label(tier: &Option<String>) -> &str {
    tier.as_deref().unwrap_or("none")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Impact;

    fn spec(version: &str, tier: Option<&str>, maps: &[&str], requirements: &[&str]) -> BoardSpec {
        BoardSpec {
            board: "AQA".to_string(),
            subject: "Biology".to_string(),
            level: "GCSE".to_string(),
            spec_version: version.to_string(),
            topic: "photosynthesis".to_string(),
            tier: tier.map(str::to_string),
            maps_to_dfe: maps.iter().map(|s| s.to_string()).collect(),
            exam_requirements: requirements.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_identical_specs_have_no_changes() {
        let a = spec("2024", None, &["S1"], &["R1"]);
        let diff = diff_specs(&a, &a);
        assert!(diff.changes.is_empty());
        assert_eq!(diff.from_version, "2024");
    }

    #[test]
    fn test_classifies_every_change() {
        let old = spec("2024", Some("foundation"), &["S1", "S2"], &["R1", "R2"]);
        let new = spec("2025", Some("higher"), &["S2", "S3"], &["R2", "R3"]);
        let diff = diff_specs(&old, &new);

        let summary: Vec<(ChangeType, &str, Impact)> = diff
            .changes
            .iter()
            .map(|c| (c.change_type, c.detail.as_str(), c.impact))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ChangeType::RequirementRemoved, "R1", Impact::LessonContent),
                (ChangeType::RequirementAdded, "R3", Impact::LessonContent),
                (ChangeType::MappingRemoved, "S1", Impact::StatutoryCoverage),
                (ChangeType::MappingAdded, "S3", Impact::StatutoryCoverage),
                (ChangeType::TierChanged, "foundation -> higher", Impact::Assessment),
            ]
        );
        assert_eq!(diff.to_version, "2025");
    }

    #[test]
    fn test_inputs_are_untouched() {
        let old = spec("2024", None, &["S1"], &["R1"]);
        let new = spec("2025", Some("higher"), &[], &[]);
        let (old_copy, new_copy) = (old.clone(), new.clone());
        let _ = diff_specs(&old, &new);
        assert_eq!(old, old_copy);
        assert_eq!(new, new_copy);
    }
}
