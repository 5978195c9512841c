//! Configuration for the conversational voice agent.
//!
//! All values are sourced from environment variables at process start via
//! [`Config::from_env`], with defaults matching the original system. Each
//! sub-section has its own `Default` impl so tests can construct a `Config`
//! without touching the environment.

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Speech-to-text settings.
    pub stt: SttConfig,
    /// Text-to-speech settings.
    pub tts: TtsConfig,
    /// Turn detection thresholds.
    pub turn_detection: TurnDetectionConfig,
    /// LLM provider settings.
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if a numeric environment variable is
    /// present but cannot be parsed, or if `LLM_PROVIDER` names an unknown
    /// backend.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            stt: SttConfig {
                model_size: env_string("WHISPER_MODEL_SIZE", "base"),
                device: env_string("WHISPER_DEVICE", "cpu"),
                compute_type: env_string("WHISPER_COMPUTE_TYPE", "int8"),
            },
            tts: TtsConfig {
                voice: env_string("TTS_VOICE", "ko-KR-SunHiNeural"),
            },
            turn_detection: TurnDetectionConfig {
                silence_ms: env_u64("TURN_DETECTION_SILENCE_MS", 800)?,
                min_speech_ms: env_u64("TURN_DETECTION_MIN_SPEECH_MS", 300)?,
                prefix_padding_ms: env_u64("TURN_DETECTION_PREFIX_PADDING_MS", 300)?,
                interrupt_threshold_ms: env_u64("INTERRUPT_THRESHOLD_MS", 500)?,
            },
            llm: LlmConfig::from_env()?,
        })
    }
}

/// Speech-to-text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Whisper model size (e.g. "base", "small", "medium").
    pub model_size: String,
    /// Inference device ("cpu", "cuda").
    pub device: String,
    /// Quantization / compute type (e.g. "int8").
    pub compute_type: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model_size: "base".to_owned(),
            device: "cpu".to_owned(),
            compute_type: "int8".to_owned(),
        }
    }
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Voice id passed to the synthesizer.
    pub voice: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            voice: "ko-KR-SunHiNeural".to_owned(),
        }
    }
}

/// Turn detection thresholds (see the turn detector state machine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnDetectionConfig {
    /// Debounce window after `EndOfSpeech` before a turn commits, in ms.
    pub silence_ms: u64,
    /// Minimum captured speech duration to avoid being dropped as noise, in ms.
    pub min_speech_ms: u64,
    /// Span of the pre-speech prefix ring-buffer, in ms.
    pub prefix_padding_ms: u64,
    /// Minimum speech duration while the agent is speaking to count as an interrupt, in ms.
    pub interrupt_threshold_ms: u64,
}

impl Default for TurnDetectionConfig {
    fn default() -> Self {
        Self {
            silence_ms: 800,
            min_speech_ms: 300,
            prefix_padding_ms: 300,
            interrupt_threshold_ms: 500,
        }
    }
}

/// Which LLM backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server.
    Ollama,
    /// Any OpenAI-compatible chat completions API.
    Openai,
    /// Anthropic Claude Messages API.
    Claude,
    /// Google Gemini generateContent API.
    Gemini,
}

impl Default for LlmBackend {
    fn default() -> Self {
        Self::Ollama
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = AgentError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::Openai),
            "claude" => Ok(Self::Claude),
            "gemini" => Ok(Self::Gemini),
            other => Err(AgentError::Config(format!(
                "unknown LLM provider type: {other}"
            ))),
        }
    }
}

/// LLM provider configuration; only the fields for the selected `backend` matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Selected backend.
    pub backend: LlmBackend,
    /// Base URL for the Ollama server.
    pub ollama_base_url: String,
    /// Model name for Ollama.
    pub ollama_model: String,
    /// API key for OpenAI-compatible providers.
    pub openai_api_key: String,
    /// Model name for OpenAI-compatible providers.
    pub openai_model: String,
    /// Base URL override for OpenAI-compatible providers.
    pub openai_base_url: Option<String>,
    /// Anthropic API key.
    pub anthropic_api_key: String,
    /// Anthropic (Claude) model name.
    pub claude_model: String,
    /// Google Gemini API key.
    pub gemini_api_key: String,
    /// Gemini model name.
    pub gemini_model: String,
}

impl LlmConfig {
    fn from_env() -> Result<Self> {
        let backend = env_string("LLM_PROVIDER", "ollama").parse()?;
        Ok(Self {
            backend,
            ollama_base_url: env_string("OLLAMA_BASE_URL", "http://localhost:11434"),
            ollama_model: env_string("OLLAMA_MODEL", "llama3.2:3b"),
            openai_api_key: env_string("OPENAI_API_KEY", ""),
            openai_model: env_string("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: std::env::var("OPENAI_BASE_URL").ok(),
            anthropic_api_key: env_string("ANTHROPIC_API_KEY", ""),
            claude_model: env_string("CLAUDE_MODEL", "claude-sonnet-4-20250514"),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_model: env_string("GEMINI_MODEL", "gemini-1.5-flash"),
        })
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AgentError::Config(format!("{name} must be an integer, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
