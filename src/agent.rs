//! Agent lifecycle: model prewarm, room connect, outbound track publish, and
//! per-participant pipeline spawning.
//!
//! This mirrors the original system's `prewarm()` / `entrypoint()` split: the
//! process prewarms its model handles once, then for each room job connects,
//! publishes the TTS output track, and spawns one [`ConversationPipeline`]
//! per `track_subscribed` event.

use crate::config::{Config, TurnDetectionConfig};
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::pipeline::ConversationPipeline;
use crate::stt::Transcriber;
use crate::transport::{PublishOptions, RoomTransport, TrackSource};
use crate::tts::Synthesizer;
use crate::vad::VadEngine;
use std::sync::Arc;
use tracing::{error, info};

/// Label the outbound TTS track is published under.
pub const AGENT_TRACK_LABEL: &str = "agent-voice";

/// The process-wide model handles an agent needs before it can take a job.
///
/// Constructing this struct *is* the prewarm step: by the time an
/// `AgentDependencies` exists, the STT model, LLM provider, and VAD engine
/// are already loaded behind their `Arc`s, so no per-job load ever happens
/// on the hot path.
pub struct AgentDependencies {
    /// Speech-to-text engine, shared across every pipeline.
    pub transcriber: Arc<dyn Transcriber>,
    /// STT model identifier, carried through to `stt_transcription` metrics.
    pub stt_model_name: String,
    /// Voice-activity-detection engine; each pipeline asks it for its own
    /// per-track detector session.
    pub vad_engine: Arc<dyn VadEngine>,
    /// The configured LLM backend.
    pub llm: Arc<dyn LlmProvider>,
    /// Text-to-speech engine, shared across every pipeline.
    pub synthesizer: Arc<dyn Synthesizer>,
}

impl AgentDependencies {
    /// Build the dependency set and log one readiness line per model, the
    /// Rust analogue of the original `prewarm(proc)` hook.
    pub fn prewarm(
        transcriber: Arc<dyn Transcriber>,
        stt_model_name: impl Into<String>,
        vad_engine: Arc<dyn VadEngine>,
        llm: Arc<dyn LlmProvider>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        let stt_model_name = stt_model_name.into();
        info!(model = %stt_model_name, "STT model prewarmed");
        info!(
            provider = llm.provider_type(),
            model = llm.model_name(),
            "LLM provider prewarmed"
        );
        info!("VAD engine prewarmed");
        Self {
            transcriber,
            stt_model_name,
            vad_engine,
            llm,
            synthesizer,
        }
    }
}

/// One job's worth of agent state: a room connection plus the prewarmed
/// dependencies every spawned pipeline shares.
pub struct Agent {
    room: Arc<dyn RoomTransport>,
    deps: AgentDependencies,
    turn_config: TurnDetectionConfig,
    tts_voice: String,
}

impl Agent {
    /// Build an agent for one room job.
    pub fn new(room: Arc<dyn RoomTransport>, deps: AgentDependencies, config: &Config) -> Self {
        Self {
            room,
            deps,
            turn_config: config.turn_detection.clone(),
            tts_voice: config.tts.voice.clone(),
        }
    }

    /// Connect to the room, publish the outbound audio track, and spawn one
    /// [`ConversationPipeline`] per subscribed remote audio track until the
    /// room connection closes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Transport`] if the room connect
    /// or outbound track publish fails; these are fatal for this job.
    pub async fn run(self) -> Result<()> {
        self.room.connect().await?;
        info!("connected to room");

        let outbound: Arc<dyn crate::transport::AudioSource> = Arc::from(
            self.room
                .publish_audio_track(
                    AGENT_TRACK_LABEL,
                    PublishOptions {
                        source: TrackSource::Microphone,
                    },
                )
                .await?,
        );
        info!(label = AGENT_TRACK_LABEL, "published outbound audio track");

        while let Some(subscription) = self.room.next_track_subscribed().await {
            let participant = subscription.participant.clone();
            info!(participant = %participant, "processing audio from participant");

            let pipeline = Arc::new(ConversationPipeline::new(
                participant.clone(),
                self.deps.stt_model_name.clone(),
                Arc::clone(&self.deps.transcriber),
                Arc::clone(&self.deps.llm),
                Arc::clone(&self.deps.synthesizer),
                self.tts_voice.clone(),
                self.turn_config.clone(),
            ));
            let vad = self.deps.vad_engine.new_detector();
            let outbound = Arc::clone(&outbound);
            let room = Arc::clone(&self.room);

            let handle = tokio::spawn(async move {
                pipeline.run(subscription.track, vad, outbound, room).await;
            });

            tokio::spawn(async move {
                if let Err(join_err) = handle.await {
                    error!(participant = %participant, error = %join_err, "conversation pipeline task panicked");
                }
            });
        }

        info!("room connection closed, agent shutting down");
        Ok(())
    }
}
