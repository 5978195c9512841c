//! Voice activity detection engine surface consumed by the turn detector.

use crate::error::Result;
use crate::transport::AudioFrame;
use async_trait::async_trait;
use std::time::Instant;

/// The two events a VAD engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadEventKind {
    /// Speech has started.
    StartOfSpeech,
    /// Speech has ended.
    EndOfSpeech,
}

/// A single VAD event with the instant it was raised.
#[derive(Debug, Clone, Copy)]
pub struct VadEvent {
    /// Which edge this event represents.
    pub kind: VadEventKind,
    /// Monotonic instant the event was raised at.
    pub at: Instant,
}

impl VadEvent {
    /// Build an event with the current instant.
    pub fn now(kind: VadEventKind) -> Self {
        Self {
            kind,
            at: Instant::now(),
        }
    }
}

/// A streaming voice activity detector.
///
/// Implementations consume frames one at a time and report at most one
/// event per call. The turn detector owns debouncing and segment assembly;
/// this trait only reports raw speech/silence edges.
#[async_trait]
pub trait VoiceActivityDetector: Send {
    /// Feed one audio frame and return an event if a speech/silence edge was
    /// detected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Vad`] if the engine fails to
    /// process the frame.
    async fn process_frame(&mut self, frame: &AudioFrame) -> Result<Option<VadEvent>>;

    /// Reset internal state, e.g. after a turn commits.
    fn reset(&mut self);
}

/// The prewarmed, process-wide VAD model handle.
///
/// Model weights are loaded once at startup; each pipeline asks the engine
/// for its own [`VoiceActivityDetector`] session so that per-track state
/// (e.g. a running energy estimate) never crosses participants.
pub trait VadEngine: Send + Sync {
    /// Create a fresh per-track detector bound to this engine's model.
    fn new_detector(&self) -> Box<dyn VoiceActivityDetector>;
}
