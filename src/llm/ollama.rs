//! Ollama chat backend (`POST /api/chat`).

use super::{ChatMessage, ChatParams, LlmProvider, LlmResponse, Role, Usage, LLM_REQUEST_TIMEOUT};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use serde_json::json;

/// Talks to a local (or remote) Ollama server.
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Build a provider for the given server and model.
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
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
impl LlmProvider for OllamaProvider {
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
            "stream": false,
        });

        if params.temperature.is_some() || params.max_tokens.is_some() {
            let mut options = serde_json::Map::new();
            if let Some(t) = params.temperature {
                options.insert("temperature".into(), json!(t));
            }
            if let Some(m) = params.max_tokens {
                options.insert("num_predict".into(), json!(m));
            }
            body["options"] = serde_json::Value::Object(options);
        }

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
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

        let content = parsed["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_owned();

        let eval_count = parsed.get("eval_count").and_then(serde_json::Value::as_u64);
        let usage = eval_count.map(|completion| {
            let prompt = parsed
                .get("prompt_eval_count")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }
        });

        Ok(LlmResponse {
            content,
            model: self.model.clone(),
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_type(&self) -> &'static str {
        "ollama"
    }
}
