//! Shared test doubles for the conversation-pipeline integration tests.
//!
//! These mirror the mocks in `src/agent.rs`'s own test module but add
//! scripting: a [`ScriptedTrack`]/[`ScriptedVad`] pair that replays a fixed
//! sequence of frames and VAD edges with controlled real-time pacing, so the
//! debounce timer races deterministically against incoming frames instead of
//! depending on however fast the mock happens to run.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use turnwise::config::TurnDetectionConfig;
use turnwise::error::{AgentError, Result};
use turnwise::llm::{ChatMessage, ChatParams, LlmProvider, LlmResponse};
use turnwise::stt::{SttOptions, Transcriber, Transcription};
use turnwise::transport::{
    AudioFrame, AudioSource, ParticipantId, PublishOptions, RemoteAudioTrack, RoomTransport,
    TrackSubscription,
};
use turnwise::tts::Synthesizer;
use turnwise::vad::{VadEvent, VadEventKind, VoiceActivityDetector};

/// One scripted step: a frame, the VAD edge (if any) it carries, and how
/// long the track should wait before handing it back.
pub struct ScriptStep {
    pub frame: AudioFrame,
    pub event: Option<VadEventKind>,
    pub delay: Duration,
}

/// Build a 20ms, 48kHz mono frame at the given offset from `base`.
pub fn frame_at(base: Instant, offset_ms: u64) -> AudioFrame {
    AudioFrame {
        sample_rate: 48_000,
        channels: 1,
        samples: vec![2_000i16; 960],
        captured_at: base + Duration::from_millis(offset_ms),
    }
}

pub struct ScriptedTrack {
    steps: VecDeque<ScriptStep>,
}

impl ScriptedTrack {
    pub fn new(steps: Vec<ScriptStep>) -> (Self, VecDeque<Option<VadEventKind>>) {
        let events = steps.iter().map(|s| s.event).collect();
        (
            Self {
                steps: steps.into_iter().collect(),
            },
            events,
        )
    }
}

#[async_trait]
impl RemoteAudioTrack for ScriptedTrack {
    async fn next_frame(&mut self) -> Result<Option<AudioFrame>> {
        match self.steps.pop_front() {
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                Ok(Some(step.frame))
            }
            None => Ok(None),
        }
    }
}

pub struct ScriptedVad {
    events: VecDeque<Option<VadEventKind>>,
}

impl ScriptedVad {
    pub fn new(events: VecDeque<Option<VadEventKind>>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl VoiceActivityDetector for ScriptedVad {
    async fn process_frame(&mut self, frame: &AudioFrame) -> Result<Option<VadEvent>> {
        let kind = self.events.pop_front().flatten();
        Ok(kind.map(|k| VadEvent {
            kind: k,
            at: frame.captured_at,
        }))
    }

    fn reset(&mut self) {}
}

/// Captures every outbound data-channel publish and every outbound audio
/// frame, for assertion after a pipeline run.
#[derive(Default)]
pub struct RecordingRoom {
    pub published: Mutex<Vec<String>>,
    pub outbound_frames: Mutex<Vec<AudioFrame>>,
}

pub struct RecordingAudioSource {
    frames: Arc<Mutex<Vec<AudioFrame>>>,
}

#[async_trait]
impl AudioSource for RecordingAudioSource {
    async fn capture_frame(&self, frame: AudioFrame) -> Result<()> {
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }
}

#[async_trait]
impl RoomTransport for RecordingRoom {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn publish_audio_track(
        &self,
        _label: &str,
        _options: PublishOptions,
    ) -> Result<Box<dyn AudioSource>> {
        unreachable!("pipeline tests call ConversationPipeline::run directly, not via Agent")
    }

    async fn publish_data(&self, bytes: &[u8], _reliable: bool) -> Result<()> {
        let text = String::from_utf8(bytes.to_vec()).expect("events are UTF-8 JSON");
        self.published.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_track_subscribed(&self) -> Option<TrackSubscription> {
        None
    }
}

/// An `AudioSource` standing in for the pipeline's outbound track, recording
/// every frame it's handed during playback.
pub fn recording_outbound() -> (Arc<dyn AudioSource>, Arc<Mutex<Vec<AudioFrame>>>) {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let source = Arc::new(RecordingAudioSource {
        frames: Arc::clone(&frames),
    });
    (source, frames)
}

/// An LLM stub that always succeeds with a fixed reply.
pub struct FixedLlm {
    pub reply: String,
}

#[async_trait]
impl LlmProvider for FixedLlm {
    async fn chat(&self, _messages: &[ChatMessage], _params: ChatParams) -> Result<LlmResponse> {
        Ok(LlmResponse {
            content: self.reply.clone(),
            model: "fixed".to_owned(),
            usage: None,
        })
    }
    fn model_name(&self) -> &str {
        "fixed"
    }
    fn provider_type(&self) -> &'static str {
        "fixed"
    }
}

/// An LLM stub that always fails, optionally after a delay (to simulate a
/// slow backend without blocking other participants' pipelines).
pub struct FailingLlm {
    pub delay: Duration,
}

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn chat(&self, _messages: &[ChatMessage], _params: ChatParams) -> Result<LlmResponse> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Err(AgentError::LlmRequest {
            status: None,
            body: "simulated backend outage".into(),
        })
    }
    fn model_name(&self) -> &str {
        "failing"
    }
    fn provider_type(&self) -> &'static str {
        "failing"
    }
}

pub fn participant(name: &str) -> ParticipantId {
    name.to_owned()
}

/// Turn-detection thresholds scaled down so debounce/prefix timing resolves
/// in tens of milliseconds instead of the production 300-800ms range.
pub fn fast_turn_config() -> TurnDetectionConfig {
    TurnDetectionConfig {
        silence_ms: 40,
        min_speech_ms: 100,
        prefix_padding_ms: 100,
        interrupt_threshold_ms: 100,
    }
}

/// The exact apology text `ConversationPipeline` substitutes when the LLM
/// call fails.
pub const APOLOGY_TEXT: &str = "죄송합니다, 응답을 생성하는 데 문제가 발생했습니다.";

/// Eight 20ms frames (160ms of content) bracketed by Start/EndOfSpeech,
/// comfortably above the 100ms `fast_turn_config` `min_speech_ms`, followed
/// by a trailing frame held open past the 40ms debounce deadline (140ms +
/// 40ms = 180ms after `base`) so the commit fires deterministically before
/// the track ends.
pub fn clean_utterance_steps(base: Instant) -> Vec<ScriptStep> {
    let mut steps = Vec::new();
    for i in 0..8u64 {
        steps.push(ScriptStep {
            frame: frame_at(base, i * 20),
            event: match i {
                0 => Some(VadEventKind::StartOfSpeech),
                7 => Some(VadEventKind::EndOfSpeech),
                _ => None,
            },
            delay: Duration::ZERO,
        });
    }
    steps.push(ScriptStep {
        frame: frame_at(base, 300),
        event: None,
        delay: Duration::from_millis(250),
    });
    steps
}

/// A transcriber that always returns the same fixed text, independent of
/// the PCM it's handed.
pub struct FixedTranscriber {
    pub text: String,
}

impl Transcriber for FixedTranscriber {
    fn transcribe(&self, _pcm_f32_16k: &[f32], _options: &SttOptions) -> Result<Transcription> {
        Ok(Transcription {
            text: self.text.clone(),
            language: Some("ko".to_owned()),
        })
    }
}

/// A synthesizer that returns no audio bytes, so playback is skipped.
pub struct SilentSynthesizer;

#[async_trait]
impl Synthesizer for SilentSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}
