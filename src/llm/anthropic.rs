//! Anthropic Claude chat backend (`POST /v1/messages`).

use super::{
    ChatMessage, ChatParams, LlmProvider, LlmResponse, Role, Usage, DEFAULT_MAX_TOKENS,
    LLM_REQUEST_TIMEOUT,
};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Talks to the Anthropic Messages API.
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl ClaudeProvider {
    /// Build a provider for the given model.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_owned(),
            client: reqwest::Client::builder()
                .timeout(LLM_REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client config is valid"),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn chat(&self, messages: &[ChatMessage], params: ChatParams) -> Result<LlmResponse> {
        // Anthropic has no "system" role inside messages; concatenate all
        // system messages into a top-level `system` field instead.
        let mut system_prompt: Option<String> = None;
        let mut chat_messages = Vec::new();

        for m in messages {
            match m.role {
                Role::System => {
                    system_prompt = Some(match system_prompt {
                        Some(existing) => format!("{existing}\n{}", m.content),
                        None => m.content.clone(),
                    });
                }
                Role::User => chat_messages.push(json!({"role": "user", "content": m.content})),
                Role::Assistant => {
                    chat_messages.push(json!({"role": "assistant", "content": m.content}));
                }
            }
        }

        let mut body = json!({
            "model": self.model,
            "max_tokens": params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": chat_messages,
        });
        if let Some(system) = &system_prompt {
            body["system"] = json!(system);
        }
        if let Some(t) = params.temperature {
            body["temperature"] = json!(t);
        }

        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::LlmRequest {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::LlmRequest {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let parsed: serde_json::Value =
            response.json().await.map_err(|e| AgentError::LlmRequest {
                status: None,
                body: e.to_string(),
            })?;

        let mut content = String::new();
        if let Some(blocks) = parsed["content"].as_array() {
            for block in blocks {
                if block["type"].as_str() == Some("text") {
                    content.push_str(block["text"].as_str().unwrap_or(""));
                }
            }
        }

        let model = parsed["model"].as_str().unwrap_or(&self.model).to_owned();

        let usage = parsed.get("usage").map(|u| {
            let input = u["input_tokens"].as_u64().unwrap_or(0);
            let output = u["output_tokens"].as_u64().unwrap_or(0);
            Usage {
                prompt_tokens: input,
                completion_tokens: output,
                total_tokens: input + output,
            }
        });

        Ok(LlmResponse {
            content,
            model,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_type(&self) -> &'static str {
        "claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn system_messages_concatenate_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(serde_json::json!({
                "system": "first\nsecond",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "claude-sonnet-4-20250514",
                "content": [{"type": "text", "text": "ok"}],
                "usage": {"input_tokens": 1, "output_tokens": 1},
            })))
            .mount(&server)
            .await;

        let provider = ClaudeProvider::new("ak-test".to_owned(), "claude-sonnet-4-20250514".to_owned())
            .with_base_url(server.uri());
        let resp = provider
            .chat(
                &[
                    ChatMessage::system("first"),
                    ChatMessage::system("second"),
                    ChatMessage::user("hi"),
                ],
                ChatParams::default(),
            )
            .await
            .unwrap();

        // The mock only matches a request whose `system` field is the
        // newline-joined concatenation of both system messages, in order;
        // a mismatch here would surface as a 404 from wiremock instead.
        assert_eq!(resp.content, "ok");
    }

    #[tokio::test]
    async fn chat_concatenates_text_blocks_and_reports_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "ak-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "claude-sonnet-4-20250514",
                "content": [
                    {"type": "text", "text": "hello "},
                    {"type": "text", "text": "world"},
                ],
                "usage": {"input_tokens": 4, "output_tokens": 6},
            })))
            .mount(&server)
            .await;

        let provider = ClaudeProvider::new("ak-test".to_owned(), "claude-sonnet-4-20250514".to_owned())
            .with_base_url(server.uri());
        let resp = provider
            .chat(
                &[ChatMessage::system("be terse"), ChatMessage::user("hi")],
                ChatParams::default(),
            )
            .await
            .unwrap();

        assert_eq!(resp.content, "hello world");
        assert_eq!(resp.usage.unwrap().total_tokens, 10);
    }
}
