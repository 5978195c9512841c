//! Speech-to-text engine surface consumed by the conversation pipeline.

use crate::error::Result;

/// Fixed decoding options the pipeline passes to every transcription call.
///
/// These mirror the original system's whisper invocation: the turn detector
/// has already gated on voice activity, so the engine's own VAD pre-filter
/// is disabled.
#[derive(Debug, Clone)]
pub struct SttOptions {
    /// Language hint passed to the engine.
    pub language: String,
    /// Beam search width.
    pub beam_size: u32,
    /// Whether the engine should run its own VAD pre-filter.
    pub vad_filter: bool,
    /// Minimum average log-probability to accept a decode.
    pub log_prob_threshold: f32,
    /// Whether to condition decoding on the engine's own previous output.
    pub condition_on_previous_text: bool,
}

impl Default for SttOptions {
    fn default() -> Self {
        Self {
            language: "ko".to_owned(),
            beam_size: 5,
            vad_filter: false,
            log_prob_threshold: -2.0,
            condition_on_previous_text: false,
        }
    }
}

/// A transcription result for one committed speech segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    /// Recognized text.
    pub text: String,
    /// Language code reported by the engine, if any.
    pub language: Option<String>,
}

/// A speech-to-text engine.
///
/// Implementations receive mono float32 PCM at 16 kHz and return a single
/// transcription for the whole buffer; there is no streaming partial-result
/// interface because the turn detector already delimits complete utterances
/// before STT runs.
///
/// This trait is deliberately synchronous: inference is CPU-bound, and the
/// pipeline is the one responsible for running it through
/// `tokio::task::spawn_blocking` so the event loop is never stalled.
pub trait Transcriber: Send + Sync {
    /// Transcribe a complete utterance.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Stt`] if the engine fails.
    fn transcribe(&self, pcm_f32_16k: &[f32], options: &SttOptions) -> Result<Transcription>;
}
