//! Governed slot generation
//!
//! - `policy` - feature flag, kill switch and allowlist gates
//! - `client` - chat-completion request and response handling
//! - `executor` - runs a job spec and emits telemetry per job

pub mod client;
pub mod executor;
pub mod policy;

pub use client::{decode_completion, ChatMessage, ChatRequest, GenerativeClient};
pub use executor::{Executor, VERBATIM_SOURCE_MISSING};
pub use policy::{
    check_policy, gate, DenyReason, GateDecision, PolicyCheckReport, PolicyDecisionRecord,
    PolicyEngine,
};
