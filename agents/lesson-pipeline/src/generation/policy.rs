//! Generation gates
//!
//! A job may reach the generative service only if, in order: the feature
//! flag is on, the job spec sets `allowAI: true`, the kill switch is off and
//! an enabled allowlist rule matches the job. The first failing check names
//! the denial.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::RuntimeSwitches;
use crate::contracts::*;
use crate::document;

/// Why a job was kept off the generative path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    AiFeatureDisabled,
    AllowAiNotSet,
    KillSwitchActive,
    PolicyUnavailable,
    PolicyDisabled,
    NoMatchingRule,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::AiFeatureDisabled => "AI_FEATURE_DISABLED",
            DenyReason::AllowAiNotSet => "ALLOW_AI_NOT_SET",
            DenyReason::KillSwitchActive => "KILL_SWITCH_ACTIVE",
            DenyReason::PolicyUnavailable => "POLICY_UNAVAILABLE",
            DenyReason::PolicyDisabled => "POLICY_DISABLED",
            DenyReason::NoMatchingRule => "NO_MATCHING_RULE",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(DenyReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Deny-by-default allowlist evaluation
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    policy: Option<AllowlistPolicy>,
}

impl PolicyEngine {
    pub fn new(policy: AllowlistPolicy) -> Self {
        Self {
            policy: Some(policy),
        }
    }

    /// No policy at all: every job is denied
    pub fn default_deny() -> Self {
        Self { policy: None }
    }

    /// Load a policy file. A missing, unreadable or malformed policy yields
    /// [`PolicyEngine::default_deny`] rather than an error.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::info!("no allowlist policy given, denying all generation");
            return Self::default_deny();
        };
        match document::load::<AllowlistPolicy>(SchemaId::AllowlistPolicy, Some(path)) {
            Ok(policy) => Self::new(policy),
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    error = %e,
                    "allowlist policy unusable, denying all generation"
                );
                Self::default_deny()
            }
        }
    }

    pub fn policy(&self) -> Option<&AllowlistPolicy> {
        self.policy.as_ref()
    }

    /// Evaluate the allowlist alone
    pub fn evaluate(&self, applies_to: &AppliesTo, job: &JobItem) -> GateDecision {
        let policy = match &self.policy {
            Some(policy) => policy,
            None => return GateDecision::Deny(DenyReason::PolicyUnavailable),
        };
        if !policy.enabled {
            return GateDecision::Deny(DenyReason::PolicyDisabled);
        }
        match policy.mode {
            PolicyMode::DenyByDefault => {}
        }

        if policy
            .rules
            .iter()
            .any(|rule| rule_matches(rule, applies_to, job))
        {
            GateDecision::Allow
        } else {
            GateDecision::Deny(DenyReason::NoMatchingRule)
        }
    }
}

fn rule_matches(rule: &PolicyRule, applies_to: &AppliesTo, job: &JobItem) -> bool {
    let scope = &rule.applies_to;
    rule.enabled
        && scope.subject.contains(&applies_to.subject)
        && scope.level.contains(&applies_to.level)
        && scope.board.contains(&applies_to.board)
        && scope.spec_version.contains(&applies_to.spec_version)
        && rule.kinds.as_ref().map_or(true, |kinds| kinds.contains(&job.kind))
        && rule
            .slot_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&job.slot_id))
}

/// Full gate chain for one job, first denial wins
pub fn gate(
    switches: &RuntimeSwitches,
    spec: &GenerationJobSpec,
    engine: &PolicyEngine,
    job: &JobItem,
) -> GateDecision {
    if !switches.ai_enabled {
        return GateDecision::Deny(DenyReason::AiFeatureDisabled);
    }
    if !spec.allows_ai() {
        return GateDecision::Deny(DenyReason::AllowAiNotSet);
    }
    if switches.kill_switch {
        return GateDecision::Deny(DenyReason::KillSwitchActive);
    }
    engine.evaluate(&spec.applies_to, job)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDecisionRecord {
    pub job_id: String,
    pub slot_id: String,
    pub mode: GenerationMode,
    pub allowed: bool,
    /// Denial code; `None` when allowed
    pub reason: Option<DenyReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCheckReport {
    pub job_id: String,
    pub decisions: Vec<PolicyDecisionRecord>,
}

/// Evaluate every job's gate without contacting the service
pub fn check_policy(
    switches: &RuntimeSwitches,
    spec: &GenerationJobSpec,
    engine: &PolicyEngine,
) -> PolicyCheckReport {
    let decisions = spec
        .jobs
        .iter()
        .map(|job| {
            let decision = gate(switches, spec, engine, job);
            PolicyDecisionRecord {
                job_id: job.job_id.clone(),
                slot_id: job.slot_id.clone(),
                mode: job.mode,
                allowed: decision.is_allowed(),
                reason: match decision {
                    GateDecision::Allow => None,
                    GateDecision::Deny(reason) => Some(reason),
                },
            }
        })
        .collect();

    PolicyCheckReport {
        job_id: spec.job_id.clone(),
        decisions,
    }
}
