//! LLM provider abstraction: a uniform chat interface over four backends.

mod anthropic;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenaiProvider;

use crate::config::{Config, LlmBackend};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout applied to every LLM HTTP request.
pub const LLM_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default max output tokens when the caller doesn't specify one.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// A chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System/instruction message.
    System,
    /// User turn.
    User,
    /// Assistant turn.
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token usage reported by a backend, normalized across providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Prompt/input tokens.
    pub prompt_tokens: u64,
    /// Completion/output tokens.
    pub completion_tokens: u64,
    /// Sum of prompt and completion tokens.
    pub total_tokens: u64,
}

/// A normalized chat completion response.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text.
    pub content: String,
    /// Model name the backend actually used.
    pub model: String,
    /// Token usage, if the backend reported any.
    pub usage: Option<Usage>,
}

/// Optional sampling parameters for a chat call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatParams {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Max tokens to generate.
    pub max_tokens: Option<u32>,
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a chat completion over the given message history.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::LlmRequest`] on a network or
    /// non-2xx response.
    async fn chat(&self, messages: &[ChatMessage], params: ChatParams) -> Result<LlmResponse>;

    /// The model name this provider was configured with.
    fn model_name(&self) -> &str;

    /// The backend identifier, used in metrics (`"ollama"`, `"openai"`, ...).
    fn provider_type(&self) -> &'static str;
}

/// Builds the configured [`LlmProvider`] backend from [`Config`].
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Construct the backend named by `config.llm.backend`.
    pub fn from_config(config: &Config) -> Box<dyn LlmProvider> {
        let llm = &config.llm;
        match llm.backend {
            LlmBackend::Ollama => Box::new(OllamaProvider::new(
                llm.ollama_base_url.clone(),
                llm.ollama_model.clone(),
            )),
            LlmBackend::Openai => Box::new(OpenaiProvider::new(
                llm.openai_api_key.clone(),
                llm.openai_model.clone(),
                llm.openai_base_url.clone(),
            )),
            LlmBackend::Claude => Box::new(ClaudeProvider::new(
                llm.anthropic_api_key.clone(),
                llm.claude_model.clone(),
            )),
            LlmBackend::Gemini => Box::new(GeminiProvider::new(
                llm.gemini_api_key.clone(),
                llm.gemini_model.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    #[test]
    fn factory_selects_backend_matching_config() {
        let mut config = Config::default();
        config.llm = LlmConfig {
            backend: LlmBackend::Openai,
            openai_model: "gpt-4o-mini".to_owned(),
            ..Default::default()
        };
        let provider = LlmProviderFactory::from_config(&config);
        assert_eq!(provider.provider_type(), "openai");
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }
}
