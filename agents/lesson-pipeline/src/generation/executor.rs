//! Slot generation executor
//!
//! Jobs run sequentially. Each ends in exactly one of three states:
//!
//! - `STUB`: a gate denied the job, or verbatim source text is missing;
//!   `output` is null and this is not an error
//! - `COMPLETED`: verbatim copy, or a JSON object returned by the service
//! - `FAILED`: the service call failed; the whole run stops with an error
//!
//! Every job emits exactly one telemetry event, including the failing one.

use serde_json::{Map, Value};
use std::time::Instant;

use super::client::{ChatRequest, GenerativeClient};
use super::policy::{gate, GateDecision, PolicyEngine};
use crate::config::RuntimeSwitches;
use crate::contracts::*;
use crate::error::{PipelineError, Result};
use crate::telemetry::TelemetryEmitter;

/// Telemetry code for verbatim jobs whose slot has no text
pub const VERBATIM_SOURCE_MISSING: &str = "VERBATIM_SOURCE_MISSING";

/// Fallback telemetry code for failures that carry no service code
const EXECUTOR_ERROR: &str = "EXECUTOR_ERROR";

pub struct Executor {
    switches: RuntimeSwitches,
    policy: PolicyEngine,
    config: ExecutorConfig,
    prompt: PromptContract,
    slots: Option<SlotDocument>,
    telemetry: TelemetryEmitter,
}

impl Executor {
    pub fn new(switches: RuntimeSwitches, policy: PolicyEngine, telemetry: TelemetryEmitter) -> Self {
        Self {
            switches,
            policy,
            config: ExecutorConfig::default(),
            prompt: PromptContract::default(),
            slots: None,
            telemetry,
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_prompt(mut self, prompt: PromptContract) -> Self {
        self.prompt = prompt;
        self
    }

    /// Slot document that verbatim jobs copy from
    pub fn with_slots(mut self, slots: SlotDocument) -> Self {
        self.slots = Some(slots);
        self
    }

    /// Execute every job of `spec` in order
    pub async fn run(&self, spec: &GenerationJobSpec) -> Result<GenerationReport> {
        let mut client: Option<GenerativeClient> = None;
        let mut results = Vec::with_capacity(spec.jobs.len());

        for job in &spec.jobs {
            let started = Instant::now();
            let result = match job.mode {
                GenerationMode::Verbatim => self.run_verbatim(job, started),
                GenerationMode::Generate => match gate(&self.switches, spec, &self.policy, job) {
                    GateDecision::Deny(reason) => {
                        tracing::info!(
                            job_id = %job.job_id,
                            slot_id = %job.slot_id,
                            reason = reason.code(),
                            "generation denied, emitting stub"
                        );
                        self.record(job, TelemetryPath::Stub, GenerationStatus::Stub, started, Some(reason.code()));
                        GenerationResult::stub(job)
                    }
                    GateDecision::Allow => {
                        let service = match client.take() {
                            Some(existing) => existing,
                            None => match GenerativeClient::new(&self.switches, &self.config) {
                                Ok(created) => created,
                                Err(e) => return Err(self.fail(job, started, e)),
                            },
                        };
                        let outcome = self.call_service(&service, spec, job).await;
                        client = Some(service);
                        match outcome {
                            Ok(output) => {
                                self.record(job, TelemetryPath::Openai, GenerationStatus::Completed, started, None);
                                GenerationResult::completed(job, output)
                            }
                            Err(e) => return Err(self.fail(job, started, e)),
                        }
                    }
                },
            };
            results.push(result);
        }

        Ok(GenerationReport {
            version: DOCUMENT_VERSION.to_string(),
            executor_version: EXECUTOR_VERSION.to_string(),
            job_id: spec.job_id.clone(),
            applies_to: spec.applies_to.clone(),
            generated_at: chrono::Utc::now(),
            results,
        })
    }

    fn run_verbatim(&self, job: &JobItem, started: Instant) -> GenerationResult {
        let text = self
            .slots
            .as_ref()
            .and_then(|doc| doc.slot(&job.slot_id))
            .filter(|slot| slot.kind() == job.kind)
            .and_then(FilledSlot::text)
            .filter(|text| !text.trim().is_empty());

        match text {
            Some(text) => {
                let mut output = Map::new();
                output.insert(job.output.field.clone(), Value::String(text.to_string()));
                self.record(job, TelemetryPath::Verbatim, GenerationStatus::Completed, started, None);
                GenerationResult::completed(job, output)
            }
            None => {
                tracing::info!(
                    job_id = %job.job_id,
                    slot_id = %job.slot_id,
                    "verbatim source missing, emitting stub"
                );
                self.record(
                    job,
                    TelemetryPath::Stub,
                    GenerationStatus::Stub,
                    started,
                    Some(VERBATIM_SOURCE_MISSING),
                );
                GenerationResult::stub(job)
            }
        }
    }

    async fn call_service(
        &self,
        client: &GenerativeClient,
        spec: &GenerationJobSpec,
        job: &JobItem,
    ) -> Result<Map<String, Value>> {
        let request = ChatRequest::for_job(&self.config, &self.prompt, spec, job)?;
        tracing::debug!(
            job_id = %job.job_id,
            model = %request.model,
            endpoint = %client.endpoint(),
            "calling generative service"
        );
        Ok(client.complete(&request).await?)
    }

    /// Record the FAILED event for `job` and hand the error back
    fn fail(&self, job: &JobItem, started: Instant, error: PipelineError) -> PipelineError {
        let code = error.error_code().unwrap_or(EXECUTOR_ERROR);
        tracing::error!(
            job_id = %job.job_id,
            slot_id = %job.slot_id,
            error_code = code,
            error = %error,
            "generation failed"
        );
        self.record(job, TelemetryPath::Openai, GenerationStatus::Failed, started, Some(code));
        error
    }

    fn record(
        &self,
        job: &JobItem,
        path: TelemetryPath,
        status: GenerationStatus,
        started: Instant,
        error_code: Option<&str>,
    ) {
        let event = TelemetryEvent {
            version: DOCUMENT_VERSION.to_string(),
            executor_version: EXECUTOR_VERSION.to_string(),
            job_id: job.job_id.clone(),
            slot_id: Some(job.slot_id.clone()),
            path,
            status,
            latency_ms: started.elapsed().as_millis() as u64,
            error_code: error_code.map(str::to_string),
        };
        self.telemetry.emit(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetrySink;
    use serde_json::json;

    fn spec(mode: &str) -> GenerationJobSpec {
        serde_json::from_value(json!({
            "jobId": "batch-1",
            "appliesTo": {"subject": "Biology", "level": "GCSE", "board": "AQA", "specVersion": "2025"},
            "jobs": [
                {"jobId": "j1", "slotId": "s1", "kind": "statutory", "mode": mode, "output": {"field": "content"}},
                {"jobId": "j2", "slotId": "missing", "kind": "statutory", "mode": mode, "output": {"field": "content"}}
            ]
        }))
        .unwrap()
    }

    fn slots() -> SlotDocument {
        serde_json::from_value(json!({
            "version": "1.0.0",
            "lessonId": "lesson-1",
            "slots": [{"slotId": "s1", "kind": "statutory", "required": true, "sources": ["DfE-1"], "content": "Plants make glucose."}],
            "metadata": {"requiresReview": false}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_verbatim_copies_and_stubs_missing() {
        let (sink, events) = TelemetrySink::memory();
        let executor = Executor::new(
            RuntimeSwitches::default(),
            PolicyEngine::default_deny(),
            TelemetryEmitter::new(sink),
        )
        .with_slots(slots());

        let report = executor.run(&spec("verbatim")).await.unwrap();
        assert_eq!(report.results[0].status, GenerationStatus::Completed);
        assert_eq!(
            report.results[0].output.as_ref().unwrap()["content"],
            "Plants make glucose."
        );
        assert_eq!(report.results[1].status, GenerationStatus::Stub);
        assert!(report.results[1].output.is_none());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].path, TelemetryPath::Verbatim);
        assert_eq!(events[1].error_code.as_deref(), Some(VERBATIM_SOURCE_MISSING));
    }

    #[tokio::test]
    async fn test_disabled_flag_stubs_without_client() {
        let (sink, events) = TelemetrySink::memory();
        let executor = Executor::new(
            RuntimeSwitches::default(),
            PolicyEngine::default_deny(),
            TelemetryEmitter::new(sink),
        );

        let report = executor.run(&spec("generate")).await.unwrap();
        assert!(report
            .results
            .iter()
            .all(|r| r.status == GenerationStatus::Stub));
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .all(|e| e.error_code.as_deref() == Some("AI_FEATURE_DISABLED")));
    }
}
