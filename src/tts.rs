//! Text-to-speech engine surface consumed by the conversation pipeline.

use crate::error::Result;
use async_trait::async_trait;

/// A text-to-speech engine that synthesizes a complete reply in one call.
///
/// Streaming partial transcripts and streaming TTS are out of scope; the
/// pipeline synthesizes the full LLM reply text at once and collects the
/// resulting MP3 bytes before framing them for playback.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` to MP3-encoded audio bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Tts`] if the engine fails.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}
