//! OpenAI-compatible chat backend (`POST /v1/chat/completions`).

use super::{ChatMessage, ChatParams, LlmProvider, LlmResponse, Role, Usage, LLM_REQUEST_TIMEOUT};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Talks to any OpenAI-compatible chat completions API.
pub struct OpenaiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenaiProvider {
    /// Build a provider. `base_url` defaults to the public OpenAI endpoint.
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::builder()
                .timeout(LLM_REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client config is valid"),
        }
    }

    fn role_str(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[async_trait]
impl LlmProvider for OpenaiProvider {
    async fn chat(&self, messages: &[ChatMessage], params: ChatParams) -> Result<LlmResponse> {
        let wire_messages: Vec<_> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": Self::role_str(m.role),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": wire_messages,
        });
        if let Some(t) = params.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = params.max_tokens {
            body["max_tokens"] = json!(m);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_owned();

        let model = parsed["model"].as_str().unwrap_or(&self.model).to_owned();

        let usage = parsed.get("usage").map(|u| Usage {
            prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: u["total_tokens"].as_u64().unwrap_or(0),
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
        "openai"
    }
}
