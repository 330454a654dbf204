//! Slot generation executor tests against a mock generative service
//!
//! Every gate must keep the service untouched and produce STUB results;
//! every service failure must map to its own error code and emit a FAILED
//! telemetry event before the run aborts.

use lesson_pipeline::contracts::*;
use lesson_pipeline::generation::{Executor, PolicyEngine};
use lesson_pipeline::telemetry::{TelemetryEmitter, TelemetrySink};
use lesson_pipeline::{PipelineError, RuntimeSwitches, ServiceCallError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "sk-test";

fn job_spec(allow_ai: Option<bool>) -> GenerationJobSpec {
    let mut spec = json!({
        "version": "1.0.0",
        "jobId": "photosynthesis-aqa-2025",
        "appliesTo": {"subject": "Biology", "level": "GCSE", "board": "AQA", "specVersion": "2025"},
        "jobs": [
            {"jobId": "exam-practice-gen", "slotId": "exam-practice", "kind": "examBoard", "mode": "generate", "output": {"field": "prompt"}}
        ]
    });
    if let Some(allow) = allow_ai {
        spec["metadata"] = json!({"allowAI": allow});
    }
    serde_json::from_value(spec).unwrap()
}

fn allowlist(slot_ids: &[&str]) -> PolicyEngine {
    PolicyEngine::new(
        serde_json::from_value(json!({
            "enabled": true,
            "mode": "deny_by_default",
            "rules": [{
                "enabled": true,
                "appliesTo": {
                    "subject": ["Biology"], "level": ["GCSE"], "board": ["AQA"], "specVersion": ["2025"]
                },
                "kinds": ["examBoard"],
                "slotIds": slot_ids
            }]
        }))
        .unwrap(),
    )
}

fn switches(server: &MockServer) -> RuntimeSwitches {
    RuntimeSwitches {
        ai_enabled: true,
        kill_switch: false,
        api_key: Some(API_KEY.to_string()),
        base_url: server.uri(),
        telemetry_path: None,
    }
}

fn executor(
    switches: RuntimeSwitches,
    policy: PolicyEngine,
) -> (Executor, Arc<Mutex<Vec<TelemetryEvent>>>) {
    let (sink, events) = TelemetrySink::memory();
    (
        Executor::new(switches, policy, TelemetryEmitter::new(sink)),
        events,
    )
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

async fn service_returning(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

/// A service that fails the test if it is ever called
async fn untouchable_service() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    server
}

async fn assert_stub(
    switches: RuntimeSwitches,
    spec: GenerationJobSpec,
    policy: PolicyEngine,
    expected_code: &str,
) {
    let (executor, events) = executor(switches, policy);
    let report = executor.run(&spec).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, GenerationStatus::Stub);
    assert!(report.results[0].output.is_none());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, TelemetryPath::Stub);
    assert_eq!(events[0].error_code.as_deref(), Some(expected_code));
}

#[tokio::test]
async fn test_feature_flag_off_stubs() {
    let server = untouchable_service().await;
    let off = RuntimeSwitches {
        ai_enabled: false,
        ..switches(&server)
    };
    assert_stub(off, job_spec(Some(true)), allowlist(&["exam-practice"]), "AI_FEATURE_DISABLED").await;
}

#[tokio::test]
async fn test_missing_allow_ai_stubs() {
    let server = untouchable_service().await;
    assert_stub(switches(&server), job_spec(None), allowlist(&["exam-practice"]), "ALLOW_AI_NOT_SET").await;
    assert_stub(
        switches(&server),
        job_spec(Some(false)),
        allowlist(&["exam-practice"]),
        "ALLOW_AI_NOT_SET",
    )
    .await;
}

#[tokio::test]
async fn test_kill_switch_stubs() {
    let server = untouchable_service().await;
    let killed = RuntimeSwitches {
        kill_switch: true,
        ..switches(&server)
    };
    assert_stub(killed, job_spec(Some(true)), allowlist(&["exam-practice"]), "KILL_SWITCH_ACTIVE").await;
}

#[tokio::test]
async fn test_no_matching_rule_stubs() {
    let server = untouchable_service().await;
    assert_stub(switches(&server), job_spec(Some(true)), allowlist(&["intro"]), "NO_MATCHING_RULE").await;
    assert_stub(
        switches(&server),
        job_spec(Some(true)),
        PolicyEngine::default_deny(),
        "POLICY_UNAVAILABLE",
    )
    .await;
}

#[tokio::test]
async fn test_object_content_completes() {
    let server = service_returning(ResponseTemplate::new(200).set_body_json(completion(
        r#"{"prompt": "Explain why the rate of photosynthesis levels off at high light intensity."}"#,
    )))
    .await;

    let (executor, events) = executor(switches(&server), allowlist(&["exam-practice"]));
    let report = executor.run(&job_spec(Some(true))).await.unwrap();
    lesson_pipeline::document::emit(SchemaId::GenerationReport, &report).unwrap();

    let result = &report.results[0];
    assert_eq!(result.status, GenerationStatus::Completed);
    assert_eq!(result.job_id, "exam-practice-gen");
    assert!(result.output.as_ref().unwrap()["prompt"]
        .as_str()
        .unwrap()
        .starts_with("Explain why"));

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, TelemetryPath::Openai);
    assert_eq!(events[0].status, GenerationStatus::Completed);
    assert!(events[0].error_code.is_none());
}

#[tokio::test]
async fn test_request_carries_model_and_job_context() {
    let server = service_returning(
        ResponseTemplate::new(200).set_body_json(completion(r#"{"prompt": "ok"}"#)),
    )
    .await;

    let (executor, _) = executor(switches(&server), allowlist(&["exam-practice"]));
    executor.run(&job_spec(Some(true))).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["max_tokens"], 800);
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains("photosynthesis-aqa-2025"));
}

async fn assert_service_failure(template: ResponseTemplate, expected_code: &str) {
    let server = service_returning(template).await;
    let (executor, events) = executor(switches(&server), allowlist(&["exam-practice"]));

    let err = executor.run(&job_spec(Some(true))).await.unwrap_err();
    assert_eq!(err.error_code(), Some(expected_code));

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, GenerationStatus::Failed);
    assert_eq!(events[0].path, TelemetryPath::Openai);
    assert_eq!(events[0].error_code.as_deref(), Some(expected_code));
}

#[tokio::test]
async fn test_array_content_is_rejected() {
    assert_service_failure(
        ResponseTemplate::new(200).set_body_json(completion(r#"[{"prompt": "a"}]"#)),
        "OPENAI_OUTPUT_NOT_OBJECT",
    )
    .await;
}

#[tokio::test]
async fn test_primitive_content_is_rejected() {
    assert_service_failure(
        ResponseTemplate::new(200).set_body_json(completion(r#""just a string""#)),
        "OPENAI_OUTPUT_NOT_OBJECT",
    )
    .await;
}

#[tokio::test]
async fn test_prose_content_is_rejected() {
    assert_service_failure(
        ResponseTemplate::new(200).set_body_json(completion("Here is your prompt: ...")),
        "OPENAI_CONTENT_NOT_JSON",
    )
    .await;
}

#[tokio::test]
async fn test_non_json_body_is_rejected() {
    assert_service_failure(
        ResponseTemplate::new(200).set_body_string("<html>gateway</html>"),
        "OPENAI_RESPONSE_NOT_JSON",
    )
    .await;
}

#[tokio::test]
async fn test_missing_content_is_rejected() {
    assert_service_failure(
        ResponseTemplate::new(200).set_body_json(json!({"choices": []})),
        "OPENAI_MISSING_CONTENT",
    )
    .await;
}

#[tokio::test]
async fn test_http_error_is_rejected() {
    let server = service_returning(
        ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "rate limited"}})),
    )
    .await;
    let (executor, _) = executor(switches(&server), allowlist(&["exam-practice"]));

    match executor.run(&job_spec(Some(true))).await {
        Err(PipelineError::ServiceCall(ServiceCallError::HttpStatus { status, body })) => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("expected an HTTP status failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_api_key_fails_without_calling_service() {
    let server = untouchable_service().await;
    let keyless = RuntimeSwitches {
        api_key: None,
        ..switches(&server)
    };
    let (executor, events) = executor(keyless, allowlist(&["exam-practice"]));

    let err = executor.run(&job_spec(Some(true))).await.unwrap_err();
    assert_eq!(err.error_code(), Some("OPENAI_MISSING_API_KEY"));
    assert_eq!(
        events.lock().unwrap()[0].error_code.as_deref(),
        Some("OPENAI_MISSING_API_KEY")
    );
}

#[tokio::test]
async fn test_verbatim_jobs_never_call_service() {
    let server = untouchable_service().await;
    let spec: GenerationJobSpec = serde_json::from_value(json!({
        "jobId": "verbatim-batch",
        "appliesTo": {"subject": "Biology", "level": "GCSE", "board": "AQA", "specVersion": "2025"},
        "jobs": [
            {"jobId": "copy-intro", "slotId": "intro", "kind": "statutory", "mode": "verbatim", "output": {"field": "body"}},
            {"jobId": "copy-practice", "slotId": "exam-practice", "kind": "examBoard", "mode": "verbatim", "output": {"field": "prompt"}}
        ],
        "metadata": {"allowAI": true}
    }))
    .unwrap();
    let slots: SlotDocument = serde_json::from_value(json!({
        "version": "1.0.0",
        "lessonId": "lesson-1",
        "slots": [
            {"slotId": "intro", "kind": "statutory", "required": true, "sources": [], "content": "Plants make glucose."},
            {"slotId": "exam-practice", "kind": "examBoard", "required": false, "sources": [], "prompt": null}
        ],
        "metadata": {"requiresReview": false}
    }))
    .unwrap();

    let (executor, events) = executor(switches(&server), allowlist(&["exam-practice"]));
    let report = executor.with_slots(slots).run(&spec).await.unwrap();

    assert_eq!(report.results[0].status, GenerationStatus::Completed);
    assert_eq!(report.results[0].output.as_ref().unwrap()["body"], "Plants make glucose.");
    assert_eq!(report.results[1].status, GenerationStatus::Stub);

    let events = events.lock().unwrap();
    assert_eq!(events[0].path, TelemetryPath::Verbatim);
    assert_eq!(events[1].error_code.as_deref(), Some("VERBATIM_SOURCE_MISSING"));
}

#[tokio::test]
async fn test_service_failure_stops_later_jobs() {
    let server = service_returning(ResponseTemplate::new(500)).await;
    let spec: GenerationJobSpec = serde_json::from_value(json!({
        "jobId": "two-jobs",
        "appliesTo": {"subject": "Biology", "level": "GCSE", "board": "AQA", "specVersion": "2025"},
        "jobs": [
            {"jobId": "first", "slotId": "exam-practice", "kind": "examBoard", "mode": "generate", "output": {"field": "prompt"}},
            {"jobId": "second", "slotId": "exam-practice", "kind": "examBoard", "mode": "generate", "output": {"field": "prompt"}}
        ],
        "metadata": {"allowAI": true}
    }))
    .unwrap();

    let (executor, events) = executor(switches(&server), allowlist(&["exam-practice"]));
    assert!(executor.run(&spec).await.is_err());

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(events.lock().unwrap().len(), 1);
}
