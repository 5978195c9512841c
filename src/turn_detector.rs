//! Turn detector state machine: VAD edges plus a debounce window become
//! committed speech segments.
//!
//! This is a synchronous state machine on purpose: the async sleep that
//! implements the debounce window lives in the pipeline's VAD task, which
//! schedules or cancels a timer based on the [`TurnAction`] this module
//! returns. Keeping the state transitions themselves synchronous makes them
//! directly testable without `tokio::time`.

use crate::config::TurnDetectionConfig;
use crate::transport::AudioFrame;
use crate::vad::{VadEvent, VadEventKind};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Current phase of the turn detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No active speech; frames accumulate in the prefix buffer.
    Idle,
    /// Speech is active; frames append to the open segment.
    Speaking,
    /// Silence has been observed; the debounce window is running.
    Debouncing,
}

/// A committed span of speech, ready for transcription.
#[derive(Debug, Clone, Default)]
pub struct SpeechSegment {
    frames: Vec<AudioFrame>,
}

impl SpeechSegment {
    /// Total duration of the segment in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.frames.iter().map(AudioFrame::duration_ms).sum()
    }

    /// Concatenate all frames into a single int16 PCM buffer.
    pub fn to_pcm16(&self) -> Vec<i16> {
        let mut out = Vec::new();
        for frame in &self.frames {
            out.extend_from_slice(&frame.samples);
        }
        out
    }

    /// Sample rate of the segment, taken from the first frame (0 if empty).
    pub fn sample_rate(&self) -> u32 {
        self.frames.first().map_or(0, |f| f.sample_rate)
    }

    fn push(&mut self, frame: AudioFrame) {
        self.frames.push(frame);
    }
}

/// What the pipeline should do in response to a VAD event.
#[derive(Debug, Clone)]
pub enum TurnAction {
    /// No scheduling change required.
    None,
    /// Start (or restart) the debounce timer with this deadline.
    StartDebounce {
        /// Instant at which the debounce window elapses.
        deadline: Instant,
    },
    /// Cancel any pending debounce timer; speech resumed.
    CancelDebounce,
    /// The segment was too short to be real speech and was dropped.
    Dropped,
}

/// The turn detector state machine.
pub struct TurnDetector {
    config: TurnDetectionConfig,
    state: TurnState,
    prefix: VecDeque<AudioFrame>,
    segment: SpeechSegment,
    speech_start: Option<Instant>,
    agent_speaking: bool,
    interrupt_flag: bool,
}

impl TurnDetector {
    /// Build a new turn detector for the given thresholds.
    pub fn new(config: TurnDetectionConfig) -> Self {
        Self {
            config,
            state: TurnState::Idle,
            prefix: VecDeque::new(),
            segment: SpeechSegment::default(),
            speech_start: None,
            agent_speaking: false,
            interrupt_flag: false,
        }
    }

    /// Current phase.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Tell the detector whether the agent's own TTS playback is active.
    /// Used to evaluate the interrupt condition.
    pub fn set_agent_speaking(&mut self, speaking: bool) {
        self.agent_speaking = speaking;
    }

    /// Consume and clear the interrupt flag.
    pub fn take_interrupt(&mut self) -> bool {
        std::mem::take(&mut self.interrupt_flag)
    }

    /// Feed one frame of audio. Routes to the prefix buffer while idle, or
    /// appends to the open segment while speech is active, evaluating the
    /// interrupt condition as it goes.
    pub fn ingest_frame(&mut self, frame: AudioFrame) {
        match self.state {
            TurnState::Idle => {
                let now = frame.captured_at;
                self.prefix.push_back(frame);
                let padding = Duration::from_millis(self.config.prefix_padding_ms);
                while let Some(front) = self.prefix.front() {
                    if now.saturating_duration_since(front.captured_at) > padding {
                        self.prefix.pop_front();
                    } else {
                        break;
                    }
                }
            }
            TurnState::Speaking | TurnState::Debouncing => {
                let captured_at = frame.captured_at;
                self.segment.push(frame);
                if self.agent_speaking && !self.interrupt_flag {
                    if let Some(start) = self.speech_start {
                        let elapsed = captured_at.saturating_duration_since(start);
                        if elapsed >= Duration::from_millis(self.config.interrupt_threshold_ms) {
                            self.interrupt_flag = true;
                        }
                    }
                }
            }
        }
    }

    /// Handle a VAD edge event.
    pub fn on_vad_event(&mut self, event: VadEvent) -> TurnAction {
        match (self.state, event.kind) {
            (TurnState::Idle, VadEventKind::StartOfSpeech) => {
                self.segment = SpeechSegment {
                    frames: self.prefix.drain(..).collect(),
                };
                self.speech_start = Some(event.at);
                self.state = TurnState::Speaking;
                TurnAction::None
            }
            (TurnState::Speaking, VadEventKind::EndOfSpeech) => {
                if self.segment.duration_ms() < self.config.min_speech_ms {
                    self.reset_to_idle();
                    return TurnAction::Dropped;
                }
                self.state = TurnState::Debouncing;
                let deadline = event.at + Duration::from_millis(self.config.silence_ms);
                TurnAction::StartDebounce { deadline }
            }
            (TurnState::Debouncing, VadEventKind::StartOfSpeech) => {
                self.state = TurnState::Speaking;
                TurnAction::CancelDebounce
            }
            _ => TurnAction::None,
        }
    }

    /// Called by the pipeline when a scheduled debounce timer elapses.
    ///
    /// Returns the committed segment and resets to `Idle`, or `None` if the
    /// detector is no longer debouncing (e.g. speech resumed first).
    pub fn on_debounce_expired(&mut self) -> Option<SpeechSegment> {
        if self.state != TurnState::Debouncing {
            return None;
        }
        let segment = std::mem::take(&mut self.segment);
        self.reset_to_idle();
        Some(segment)
    }

    fn reset_to_idle(&mut self) {
        self.state = TurnState::Idle;
        self.segment = SpeechSegment::default();
        self.speech_start = None;
        self.interrupt_flag = false;
        self.prefix.clear();
    }
}
