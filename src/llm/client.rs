//! Groq-compatible completion client (OpenAI wire format)
//!
//! Speaks `/chat/completions` with and without streaming. Streaming
//! responses arrive as SSE `data:` lines; fragments are surfaced in
//! arrival order with no buffering beyond the line being assembled.

use crate::config::{MAX_TOKENS, STREAM_TIMEOUT, TEMPERATURE};
use crate::llm::prompts::CRM_SYSTEM_PROMPT;
use crate::llm::{classify_completion_error, TurnStream};
use crate::transcript::Turn;
use crate::{AriaError, Result};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tracing::debug;
use uuid::Uuid;

/// Completion client holding its own runtime, so callers stay
/// synchronous from the orchestration's point of view.
pub struct GroqTurnStream {
    http: reqwest::Client,
    runtime: Runtime,
    base_url: String,
}

impl GroqTurnStream {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(STREAM_TIMEOUT)
            .build()
            .map_err(|e| AriaError::ConfigError(format!("HTTP client build failed: {}", e)))?;

        let runtime = Runtime::new()
            .map_err(|e| AriaError::ConfigError(format!("Runtime creation failed: {}", e)))?;

        Ok(Self {
            http,
            runtime,
            base_url: base_url.into(),
        })
    }

    async fn stream_inner(
        &self,
        credential: &str,
        model: &str,
        turns: &[Turn],
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let request_id = Uuid::new_v4();
        debug!(%request_id, model, turns = turns.len(), "streaming completion");

        let body = json!({
            "model": model,
            "messages": wire_messages(turns),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "stream": true,
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| AriaError::ConnectionError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(service_error(resp).await);
        }

        let fragments = fragment_stream(resp);
        futures::pin_mut!(fragments);

        let mut full = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            full.push_str(&fragment);
            on_fragment(&fragment);
        }

        debug!(%request_id, chars = full.len(), "stream complete");
        Ok(full)
    }

    async fn complete_inner(&self, credential: &str, model: &str, turns: &[Turn]) -> Result<String> {
        let body = json!({
            "model": model,
            "messages": wire_messages(turns),
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| AriaError::ConnectionError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(service_error(resp).await);
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| AriaError::CompletionError(format!("malformed response: {}", e)))?;

        Ok(v["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

impl TurnStream for GroqTurnStream {
    fn stream(
        &self,
        credential: &str,
        model: &str,
        turns: &[Turn],
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String> {
        self.runtime
            .block_on(self.stream_inner(credential, model, turns, on_fragment))
    }

    fn complete(&self, credential: &str, model: &str, turns: &[Turn]) -> Result<String> {
        self.runtime
            .block_on(self.complete_inner(credential, model, turns))
    }
}

/// Conversation turns in wire format, with the fixed system instruction
/// prepended once per request.
fn wire_messages(turns: &[Turn]) -> Vec<Value> {
    let mut messages = vec![json!({ "role": "system", "content": CRM_SYSTEM_PROMPT })];
    messages.extend(
        turns
            .iter()
            .map(|t| json!({ "role": t.role.as_str(), "content": t.content })),
    );
    messages
}

/// Parse SSE `data:` lines from the response body into text fragments
fn fragment_stream(resp: reqwest::Response) -> impl futures::Stream<Item = Result<String>> {
    async_stream::stream! {
        let mut bytes = resp.bytes_stream();
        let mut buf = String::new();

        'outer: while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(AriaError::ConnectionError(e.to_string()));
                    break 'outer;
                }
            };
            buf.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buf.find('\n') {
                let line: String = buf.drain(..=pos).collect();
                let line = line.trim();
                let data = match line.strip_prefix("data:") {
                    Some(d) => d.trim(),
                    None => continue,
                };
                if data == "[DONE]" {
                    break 'outer;
                }
                if let Some(delta) = delta_content(data) {
                    if !delta.is_empty() {
                        yield Ok(delta);
                    }
                }
            }
        }
    }
}

/// Extract the delta text from one streaming chunk
fn delta_content(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v["choices"][0]["delta"]["content"]
        .as_str()
        .map(str::to_string)
}

async fn service_error(resp: reqwest::Response) -> AriaError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    classify_completion_error(&format!("{} {}", status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;

    #[test]
    fn test_client_creation() {
        let client = GroqTurnStream::new("https://api.groq.com/openai/v1");
        assert!(client.is_ok());
    }

    #[test]
    fn test_wire_messages_prepend_system_once() {
        let mut t = Transcript::new();
        t.push_user("hello");
        t.push_assistant("hi!");

        let messages = wire_messages(t.turns());
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
    }

    #[test]
    fn test_delta_content_extraction() {
        let data = r#"{"choices":[{"delta":{"content":"Big"}}]}"#;
        assert_eq!(delta_content(data).as_deref(), Some("Big"));
    }

    #[test]
    fn test_delta_content_role_only_chunk() {
        let data = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert!(delta_content(data).is_none());
    }

    #[test]
    fn test_delta_content_malformed() {
        assert!(delta_content("not json").is_none());
    }
}
