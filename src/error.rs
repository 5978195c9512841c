//! Error types for the voice agent.

/// Top-level error type for the conversational voice agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Configuration is missing, malformed, or names an unknown backend.
    #[error("config error: {0}")]
    Config(String),

    /// Audio decode (MP3 -> PCM) failed.
    #[error("media decode error: {0}")]
    MediaDecode(String),

    /// Speech-to-text transcription failed.
    #[error("STT error: {0}")]
    Stt(String),

    /// LLM provider request failed (non-2xx response or transport failure).
    #[error("LLM request error: status={status:?}, body={body}")]
    LlmRequest {
        /// HTTP status code, if the failure came from a response rather than a transport error.
        status: Option<u16>,
        /// Response body or transport error description.
        body: String,
    },

    /// Text-to-speech synthesis failed.
    #[error("TTS error: {0}")]
    Tts(String),

    /// Room/transport error (stream ended, track unsubscribed, publish failed).
    #[error("transport error: {0}")]
    Transport(String),

    /// Voice activity detection error.
    #[error("VAD error: {0}")]
    Vad(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AgentError>;
