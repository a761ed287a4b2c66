//! Gemini `streamGenerateContent` client
//!
//! Sends the conversation as `contents`, the reply style as
//! `systemInstruction`, and reads the SSE response one candidate chunk at a
//! time.

use crate::llm::client::{FragmentStream, LanguageModelClient};
use crate::llm::config::LlmConfig;
use crate::messages::{Part, Turn};
use crate::{NyayaError, Result};
use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Finish reasons that mean the service refused to continue the answer.
const BLOCKING_FINISH_REASONS: [&str; 5] =
    ["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

pub struct GeminiClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(NyayaError::ConfigError(
                "Gemini API key is missing".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| NyayaError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

impl LanguageModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn stream(
        &self,
        history: &[Turn],
        new_parts: &[Part],
        system_instruction: &str,
    ) -> FragmentStream {
        let url = self.config.stream_url();
        let body = build_request(&self.config, history, new_parts, system_instruction);
        let http = self.http.clone();
        let api_key = self.config.api_key.clone();
        let model = self.config.model.clone();

        Box::pin(try_stream! {
            debug!("Opening Gemini stream: model={}, history={} turns", model, history_len(&body));

            let response = http
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| NyayaError::RequestError(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                Err::<(), NyayaError>(map_http_error(status, &body_text))?;
            } else {
                let mut fragments = Box::pin(sse_fragments(response.bytes_stream()));
                while let Some(fragment) = fragments.next().await {
                    let fragment = fragment?;
                    yield fragment;
                }
            }
        })
    }
}

/// Decode an SSE byte stream into the text fragments its payloads carry.
pub fn sse_fragments<S, B, E>(bytes: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    try_stream! {
        let mut events = Box::pin(bytes.eventsource());
        let mut chunks = 0usize;

        while let Some(event) = events.next().await {
            let event = event
                .map_err(|e| NyayaError::StreamError(format!("Stream read error: {}", e)))?;
            if event.data.trim() == "[DONE]" {
                continue;
            }
            chunks += 1;
            if let Some(fragment) = parse_chunk(&event.data)? {
                yield fragment;
            }
        }

        debug!("Gemini stream finished after {} chunks", chunks);
    }
}

fn history_len(body: &Value) -> usize {
    body["contents"].as_array().map_or(0, |c| c.len().saturating_sub(1))
}

/// Build the JSON body for `streamGenerateContent`.
pub fn build_request(
    config: &LlmConfig,
    history: &[Turn],
    new_parts: &[Part],
    system_instruction: &str,
) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .filter_map(|turn| {
            let parts = parts_to_wire(&turn.parts);
            if parts.is_empty() {
                None
            } else {
                Some(json!({ "role": turn.role.as_str(), "parts": parts }))
            }
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": parts_to_wire(new_parts) }));

    let mut body = json!({
        "systemInstruction": { "parts": [{ "text": system_instruction }] },
        "contents": contents,
    });

    let mut generation = serde_json::Map::new();
    if let Some(temperature) = config.temperature {
        generation.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = config.max_output_tokens {
        generation.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }
    if !generation.is_empty() {
        body["generationConfig"] = Value::Object(generation);
    }

    body
}

fn parts_to_wire(parts: &[Part]) -> Vec<Value> {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Text(text) if text.is_empty() => None,
            Part::Text(text) => Some(json!({ "text": text })),
            Part::InlineData(data) => Some(json!({ "inlineData": data })),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Parse one SSE payload into the text fragment it carries, if any.
pub fn parse_chunk(data: &str) -> Result<Option<String>> {
    let chunk: ChunkResponse = serde_json::from_str(data)
        .map_err(|e| NyayaError::StreamError(format!("Malformed response chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        let message = error
            .message
            .or(error.status)
            .unwrap_or_else(|| "An error occurred during streaming".to_string());
        return Err(NyayaError::ApiError(message));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(NyayaError::ApiError(format!("Prompt blocked: {}", reason)));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(None);
    };

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            warn!("Gemini stopped the response: {}", reason);
            return Err(NyayaError::ApiError(format!("Response blocked: {}", reason)));
        }
    }

    Ok(if text.is_empty() { None } else { Some(text) })
}

fn map_http_error(status: reqwest::StatusCode, body: &str) -> NyayaError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => NyayaError::AuthError(format!("Gemini rejected the API key: {}", message)),
        code => NyayaError::ApiError(format!("HTTP {}: {}", code, message)),
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
