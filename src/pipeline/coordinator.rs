//! The per-participant conversation pipeline: audio + VAD tasks feeding a
//! serialized STT -> LLM -> TTS -> playback turn task.

use crate::audio::codec::{decode_mp3_to_pcm16, frame_pcm16, PLAYBACK_FRAME_SAMPLES, PLAYBACK_SAMPLE_RATE};
use crate::audio::pcm::{int16_to_f32, levels, resample_linear};
use crate::config::TurnDetectionConfig;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatParams, LlmProvider};
use crate::metrics::{
    emit_llm_error, emit_llm_response, emit_pipeline_complete, emit_stt_error,
    emit_stt_transcription, emit_tts_error, emit_tts_synthesis, LlmMetric,
    PipelineCompleteMetric, SttMetric, TtsMetric,
};
use crate::pipeline::messages::{DataChannelEvent, DialogueHistory};
use crate::stt::{SttOptions, Transcriber};
use crate::transport::{AudioFrame, AudioSource, ParticipantId, RemoteAudioTrack, RoomTransport};
use crate::tts::Synthesizer;
use crate::turn_detector::{SpeechSegment, TurnAction, TurnDetector};
use crate::vad::VoiceActivityDetector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

const STT_SAMPLE_RATE: u32 = 16_000;

const SYSTEM_PROMPT: &str = "당신은 친절하고 도움이 되는 AI 어시스턴트입니다.\n\
사용자와 음성으로 대화하고 있습니다.\n\
짧고 자연스러운 대화체로 응답하세요.\n\
한국어로 응답하세요.";

const APOLOGY: &str = "죄송합니다, 응답을 생성하는 데 문제가 발생했습니다.";

/// One conversation pipeline per subscribed remote audio track.
///
/// Instances are held behind `Arc` so the turn task, spawned on each
/// debounced commit, can outlive the `select!` iteration that spawned it
/// while still sharing the dialogue history and per-pipeline turn lock.
pub struct ConversationPipeline {
    participant: ParticipantId,
    stt_model_name: String,
    transcriber: Arc<dyn Transcriber>,
    llm: Arc<dyn LlmProvider>,
    synthesizer: Arc<dyn Synthesizer>,
    tts_voice: String,
    turn_config: TurnDetectionConfig,
    history: Mutex<DialogueHistory>,
    turn_lock: Mutex<()>,
}

impl ConversationPipeline {
    /// Build a pipeline for one participant's track.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        participant: ParticipantId,
        stt_model_name: String,
        transcriber: Arc<dyn Transcriber>,
        llm: Arc<dyn LlmProvider>,
        synthesizer: Arc<dyn Synthesizer>,
        tts_voice: String,
        turn_config: TurnDetectionConfig,
    ) -> Self {
        Self {
            participant,
            stt_model_name,
            transcriber,
            llm,
            synthesizer,
            tts_voice,
            turn_config,
            history: Mutex::new(DialogueHistory::new()),
            turn_lock: Mutex::new(()),
        }
    }

    /// Drive the pipeline until the track ends.
    ///
    /// Spawns one turn task per debounced commit; the audio and VAD
    /// processing in this loop never blocks on a turn in flight.
    pub async fn run(
        self: Arc<Self>,
        mut track: Box<dyn RemoteAudioTrack>,
        mut vad: Box<dyn VoiceActivityDetector>,
        outbound: Arc<dyn AudioSource>,
        room: Arc<dyn RoomTransport>,
    ) {
        let agent_speaking = Arc::new(AtomicBool::new(false));
        let mut turn_detector = TurnDetector::new(self.turn_config.clone());

        let far_future = tokio::time::Instant::now() + Duration::from_secs(3600 * 24 * 365);
        let debounce_sleep = tokio::time::sleep_until(far_future);
        tokio::pin!(debounce_sleep);
        let mut debounce_armed = false;

        loop {
            tokio::select! {
                frame = track.next_frame() => {
                    match frame {
                        Ok(Some(frame)) => {
                            turn_detector.set_agent_speaking(agent_speaking.load(Ordering::Relaxed));
                            let vad_result = vad.process_frame(&frame).await;
                            turn_detector.ingest_frame(frame);

                            match vad_result {
                                Ok(Some(event)) => {
                                    let action = turn_detector.on_vad_event(event);
                                    if turn_detector.take_interrupt() {
                                        warn!(participant = %self.participant, "interrupt detected during agent playback");
                                    }
                                    match action {
                                        TurnAction::StartDebounce { deadline } => {
                                            debounce_sleep.as_mut().reset(tokio::time::Instant::from_std(deadline));
                                            debounce_armed = true;
                                        }
                                        TurnAction::CancelDebounce => {
                                            debounce_armed = false;
                                        }
                                        TurnAction::Dropped | TurnAction::None => {}
                                    }
                                }
                                Ok(None) => {}
                                Err(e) => {
                                    warn!(participant = %self.participant, error = %e, "VAD processing error");
                                }
                            }
                        }
                        Ok(None) | Err(_) => {
                            info!(participant = %self.participant, "audio track ended, stopping pipeline");
                            break;
                        }
                    }
                }
                () = &mut debounce_sleep, if debounce_armed => {
                    debounce_armed = false;
                    if let Some(segment) = turn_detector.on_debounce_expired() {
                        let pipeline = Arc::clone(&self);
                        let outbound = Arc::clone(&outbound);
                        let room = Arc::clone(&room);
                        let agent_speaking = Arc::clone(&agent_speaking);
                        tokio::spawn(async move {
                            pipeline.run_turn(segment, outbound, room, agent_speaking).await;
                        });
                    }
                }
            }
        }
    }

    async fn run_turn(
        self: Arc<Self>,
        segment: SpeechSegment,
        outbound: Arc<dyn AudioSource>,
        room: Arc<dyn RoomTransport>,
        agent_speaking: Arc<AtomicBool>,
    ) {
        let _turn_guard = self.turn_lock.lock().await;
        let pipeline_start = Instant::now();
        let speech_duration_ms = segment.duration_ms();

        let source_rate = segment.sample_rate();
        let pcm16 = segment.to_pcm16();
        let float_samples = int16_to_f32(&pcm16);
        let resampled = resample_linear(&float_samples, source_rate, STT_SAMPLE_RATE);
        let audio_level = levels(&resampled);

        if speech_duration_ms < self.turn_config.min_speech_ms || audio_level.is_silence() {
            return;
        }

        let stt_start = Instant::now();
        let transcriber = Arc::clone(&self.transcriber);
        let options = SttOptions::default();
        let blocking_samples = resampled.clone();
        let transcribe_result =
            tokio::task::spawn_blocking(move || transcriber.transcribe(&blocking_samples, &options))
                .await;

        let transcription = match transcribe_result {
            Ok(Ok(t)) => t,
            Ok(Err(e)) => {
                emit_stt_error(&e.to_string(), stt_start.elapsed());
                warn!(participant = %self.participant, error = %e, "STT failed, aborting turn");
                return;
            }
            Err(join_err) => {
                emit_stt_error(&join_err.to_string(), stt_start.elapsed());
                warn!(participant = %self.participant, error = %join_err, "STT task panicked");
                return;
            }
        };

        if transcription.text.trim().is_empty() {
            info!(participant = %self.participant, "empty transcription, skipping turn");
            return;
        }

        emit_stt_transcription(
            &SttMetric {
                model: &self.stt_model_name,
                audio_duration_sec: f64::from(speech_duration_ms) / 1000.0,
                text_length: transcription.text.chars().count(),
                language: transcription.language.as_deref(),
                source_sample_rate: source_rate,
                audio_level: audio_level.mean_abs,
            },
            stt_start.elapsed(),
        );
        let stt_ms = stt_start.elapsed().as_secs_f64() * 1000.0;

        if let Err(e) = room
            .publish_data(
                &DataChannelEvent::Transcription {
                    text: transcription.text.clone(),
                }
                .to_json_bytes(),
                true,
            )
            .await
        {
            warn!(participant = %self.participant, error = %e, "failed to publish transcription event");
        }

        let llm_start = Instant::now();
        let (messages, history_len_at_call) = {
            let history = self.history.lock().await;
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(ChatMessage::system(SYSTEM_PROMPT));
            messages.extend(history.messages().cloned());
            messages.push(ChatMessage::user(transcription.text.clone()));
            (messages, history.len())
        };

        let reply_text = match self.llm.chat(&messages, ChatParams::default()).await {
            Ok(resp) => {
                emit_llm_response(
                    &LlmMetric {
                        provider: self.llm.provider_type(),
                        model: &resp.model,
                        input_length: transcription.text.chars().count(),
                        output_length: resp.content.chars().count(),
                        history_length: history_len_at_call,
                    },
                    llm_start.elapsed(),
                );
                resp.content
            }
            Err(e) => {
                emit_llm_error(self.llm.provider_type(), &e.to_string(), llm_start.elapsed());
                warn!(participant = %self.participant, error = %e, "LLM request failed, substituting apology");
                APOLOGY.to_owned()
            }
        };
        let llm_ms = llm_start.elapsed().as_secs_f64() * 1000.0;

        if let Err(e) = room
            .publish_data(
                &DataChannelEvent::Response {
                    text: reply_text.clone(),
                }
                .to_json_bytes(),
                true,
            )
            .await
        {
            warn!(participant = %self.participant, error = %e, "failed to publish response event");
        }

        {
            let mut history = self.history.lock().await;
            history.push(ChatMessage::user(transcription.text.clone()));
            history.push(ChatMessage::assistant(reply_text.clone()));
        }

        let tts_start = Instant::now();
        let mp3 = match self.synthesizer.synthesize(&reply_text, &self.tts_voice).await {
            Ok(bytes) => {
                emit_tts_synthesis(
                    &TtsMetric {
                        voice: &self.tts_voice,
                        text_length: reply_text.chars().count(),
                        audio_bytes: bytes.len(),
                    },
                    tts_start.elapsed(),
                );
                bytes
            }
            Err(e) => {
                emit_tts_error(&e.to_string(), tts_start.elapsed());
                warn!(participant = %self.participant, error = %e, "TTS synthesis failed, skipping playback");
                Vec::new()
            }
        };
        let tts_ms = tts_start.elapsed().as_secs_f64() * 1000.0;

        if !mp3.is_empty() {
            agent_speaking.store(true, Ordering::Relaxed);
            let playback_result = Self::play_audio(&mp3, &outbound).await;
            agent_speaking.store(false, Ordering::Relaxed);
            if let Err(e) = playback_result {
                warn!(participant = %self.participant, error = %e, "playback failed partway through");
            }
        }

        emit_pipeline_complete(
            &PipelineCompleteMetric {
                participant: &self.participant,
                stt_ms,
                llm_ms,
                tts_ms,
                speech_duration_ms,
            },
            pipeline_start.elapsed(),
        );
    }

    async fn play_audio(mp3: &[u8], outbound: &Arc<dyn AudioSource>) -> Result<()> {
        let pcm = decode_mp3_to_pcm16(mp3)?;
        let frames = frame_pcm16(&pcm, PLAYBACK_FRAME_SAMPLES);
        for (i, chunk) in frames.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            outbound
                .capture_frame(AudioFrame {
                    sample_rate: PLAYBACK_SAMPLE_RATE,
                    channels: 1,
                    samples: chunk.clone(),
                    captured_at: Instant::now(),
                })
                .await?;
        }
        Ok(())
    }
}
