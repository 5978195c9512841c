//! Turnwise: a real-time conversational voice agent core.
//!
//! Joins a multi-participant audio room, fuses a per-participant VAD stream
//! with raw audio frames to detect turns, and drives a serialized
//! STT -> LLM -> TTS -> playback pipeline per participant.
//!
//! # Architecture
//!
//! - **[`transport`]**, **[`vad`]**, **[`stt`]**, **[`tts`]** define the
//!   external collaborator seams (room SDK, VAD engine, STT engine, TTS
//!   engine) as traits; concrete bindings are supplied by the deployment.
//! - **[`llm`]** implements four concrete chat backends behind a common
//!   [`llm::LlmProvider`] trait.
//! - **[`turn_detector`]** is the VAD-driven state machine that turns raw
//!   speech/silence edges into committed [`turn_detector::SpeechSegment`]s.
//! - **[`pipeline`]** is the core: the per-participant
//!   [`pipeline::ConversationPipeline`] that fuses audio, drives the turn
//!   detector, and serializes STT/LLM/TTS/playback.
//! - **[`agent`]** is the lifecycle: prewarm, room connect, outbound track
//!   publish, and spawning one pipeline per subscribed track.
//! - **[`metrics`]** emits one structured log line per pipeline stage.
//! - **[`audio`]** holds PCM conversion, resampling, and MP3 decode/framing.
//! - **[`config`]** and **[`error`]** are the ambient configuration and
//!   error-taxonomy layers.

pub mod agent;
pub mod audio;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod pipeline;
pub mod stt;
pub mod transport;
pub mod tts;
pub mod turn_detector;
pub mod vad;

pub use config::Config;
pub use error::{AgentError, Result};
pub use pipeline::ConversationPipeline;
