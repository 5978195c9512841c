//! Google Gemini chat backend (`POST /models/{model}:generateContent`).

use super::{
    ChatMessage, ChatParams, LlmProvider, LlmResponse, Role, Usage, DEFAULT_MAX_TOKENS,
    LLM_REQUEST_TIMEOUT,
};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Talks to the Gemini `generateContent` API.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
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
impl LlmProvider for GeminiProvider {
    async fn chat(&self, messages: &[ChatMessage], params: ChatParams) -> Result<LlmResponse> {
        // Gemini has no "system" role in `contents`; it goes in a separate
        // top-level `systemInstruction`. The "assistant" role is renamed to
        // "model".
        let mut system_instruction: Option<String> = None;
        let mut contents = Vec::new();

        for m in messages {
            match m.role {
                Role::System => {
                    system_instruction = Some(match system_instruction {
                        Some(existing) => format!("{existing}\n{}", m.content),
                        None => m.content.clone(),
                    });
                }
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{"text": m.content}],
                })),
                Role::Assistant => contents.push(json!({
                    "role": "model",
                    "parts": [{"text": m.content}],
                })),
            }
        }

        let mut generation_config = json!({
            "maxOutputTokens": params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if let Some(t) = params.temperature {
            generation_config["temperature"] = json!(t);
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if let Some(instruction) = &system_instruction {
            body["systemInstruction"] = json!({"parts": [{"text": instruction}]});
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
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

        let content = parsed["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_owned();

        let usage = parsed.get("usageMetadata").map(|u| {
            let prompt = u["promptTokenCount"].as_u64().unwrap_or(0);
            let completion = u["candidatesTokenCount"].as_u64().unwrap_or(0);
            Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: u["totalTokenCount"].as_u64().unwrap_or(prompt + completion),
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
        "gemini"
    }
}
