//! Chat-completion client for the generative service
//!
//! One POST per job, no retries. The response is decoded twice: first the
//! HTTP body as JSON, then `choices[0].message.content` as JSON. Every way
//! that can go wrong maps to its own [`ServiceCallError`].

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::RuntimeSwitches;
use crate::contracts::{ExecutorConfig, GenerationJobSpec, JobItem, PromptContract};
use crate::error::{PipelineError, Result, ServiceCallError};

/// Longest response body echoed back in an HTTP status error
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `<base>/chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Build the request for one job, embedding the full job spec as context
    pub fn for_job(
        config: &ExecutorConfig,
        prompt: &PromptContract,
        spec: &GenerationJobSpec,
        job: &JobItem,
    ) -> Result<Self> {
        let spec_json = serde_json::to_string_pretty(spec)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        let mut system = prompt.system.clone();
        for instruction in &prompt.instructions {
            system.push_str("\n- ");
            system.push_str(instruction);
        }

        let user = format!(
            "Prompt contract version: {}\n\
             Job: {} (slot {}, kind {})\n\
             Write the result under the key \"{}\".\n\
             Return strict JSON only: a single JSON object, no prose.\n\n\
             Job specification:\n{}",
            prompt.version, job.job_id, job.slot_id, job.kind, job.output.field, spec_json
        );

        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            messages: vec![ChatMessage::new("system", system), ChatMessage::new("user", user)],
        })
    }
}

/// HTTP client for the generative service
pub struct GenerativeClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GenerativeClient {
    pub fn new(switches: &RuntimeSwitches, config: &ExecutorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: switches.base_url.trim_end_matches('/').to_string(),
            api_key: switches.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send one request and return the decoded JSON object
    pub async fn complete(
        &self,
        request: &ChatRequest,
    ) -> std::result::Result<Map<String, Value>, ServiceCallError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceCallError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceCallError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceCallError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ServiceCallError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        decode_completion(&body)
    }
}

/// Decode a chat-completion body into the JSON object the model produced
pub fn decode_completion(body: &str) -> std::result::Result<Map<String, Value>, ServiceCallError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| ServiceCallError::ResponseNotJson(e.to_string()))?;

    let content = envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or(ServiceCallError::MissingContent)?;

    let output: Value = serde_json::from_str(content)
        .map_err(|e| ServiceCallError::ContentNotJson(e.to_string()))?;

    match output {
        Value::Object(map) => Ok(map),
        other => Err(ServiceCallError::OutputNotObject {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(content: &str) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    #[test]
    fn test_decodes_object_content() {
        let output = decode_completion(&body(r#"{"prompt": "Explain osmosis."}"#)).unwrap();
        assert_eq!(output["prompt"], "Explain osmosis.");
    }

    #[test]
    fn test_double_decode_failures_are_distinct() {
        assert_eq!(
            decode_completion("<html>").unwrap_err().code(),
            "OPENAI_RESPONSE_NOT_JSON"
        );
        assert_eq!(
            decode_completion(r#"{"choices": []}"#).unwrap_err().code(),
            "OPENAI_MISSING_CONTENT"
        );
        assert_eq!(
            decode_completion(&body("Sure! Here you go")).unwrap_err().code(),
            "OPENAI_CONTENT_NOT_JSON"
        );
        assert_eq!(
            decode_completion(&body("[1, 2]")).unwrap_err(),
            ServiceCallError::OutputNotObject { found: "array" }
        );
        assert_eq!(
            decode_completion(&body("42")).unwrap_err(),
            ServiceCallError::OutputNotObject { found: "number" }
        );
    }

    #[test]
    fn test_request_shape() {
        let spec: GenerationJobSpec = serde_json::from_value(json!({
            "jobId": "batch-1",
            "appliesTo": {"subject": "Biology", "level": "GCSE", "board": "AQA", "specVersion": "2025"},
            "jobs": [{"jobId": "j1", "slotId": "q1", "kind": "examBoard", "mode": "generate", "output": {"field": "prompt"}}],
            "metadata": {"allowAI": true}
        }))
        .unwrap();
        let request = ChatRequest::for_job(
            &ExecutorConfig::default(),
            &PromptContract::default(),
            &spec,
            &spec.jobs[0],
        )
        .unwrap();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["top_p"], 1.0);
        assert_eq!(value["messages"][0]["role"], "system");
        assert!(request.messages[1].content.contains("\"batch-1\""));
        assert!(request.messages[1].content.contains("\"prompt\""));
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
