//! Structured per-stage metrics.
//!
//! Each stage emits exactly one line: a `tracing::info!` event whose message
//! is `"METRIC: " + json`, so log shippers built for the original system
//! keep working unmodified against this crate's output.

use serde_json::{json, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn emit(event: &str, duration: Duration, mut fields: Value) {
    let mut record = json!({
        "event": event,
        "duration_ms": round2(duration.as_secs_f64() * 1000.0),
        "timestamp": unix_timestamp(),
    });
    if let (Some(record_map), Some(field_map)) = (record.as_object_mut(), fields.as_object_mut()) {
        record_map.append(field_map);
    }
    tracing::info!("METRIC: {record}");
}

/// STT stage fields.
pub struct SttMetric<'a> {
    /// Model size/name used for this transcription.
    pub model: &'a str,
    /// Duration of the source audio, in seconds.
    pub audio_duration_sec: f64,
    /// Length of the recognized text, in characters.
    pub text_length: usize,
    /// Language reported by the engine, if any.
    pub language: Option<&'a str>,
    /// Sample rate of the audio before resampling for STT.
    pub source_sample_rate: u32,
    /// Mean-absolute audio level of the segment.
    pub audio_level: f32,
}

/// Emit an `stt_transcription` metric.
pub fn emit_stt_transcription(metric: &SttMetric<'_>, duration: Duration) {
    emit(
        "stt_transcription",
        duration,
        json!({
            "model": metric.model,
            "audio_duration_sec": round2(metric.audio_duration_sec),
            "text_length": metric.text_length,
            "language": metric.language,
            "source_sample_rate": metric.source_sample_rate,
            "audio_level": metric.audio_level,
        }),
    );
}

/// Emit an `stt_error` metric.
pub fn emit_stt_error(error: &str, duration: Duration) {
    emit("stt_error", duration, json!({ "error": error }));
}

/// LLM stage fields.
pub struct LlmMetric<'a> {
    /// Backend identifier (`"ollama"`, `"openai"`, ...).
    pub provider: &'a str,
    /// Model name.
    pub model: &'a str,
    /// Length of the prompt sent, in characters.
    pub input_length: usize,
    /// Length of the reply text, in characters.
    pub output_length: usize,
    /// Number of messages in history at the time of the call.
    pub history_length: usize,
}

/// Emit an `llm_response` metric.
pub fn emit_llm_response(metric: &LlmMetric<'_>, duration: Duration) {
    emit(
        "llm_response",
        duration,
        json!({
            "provider": metric.provider,
            "model": metric.model,
            "input_length": metric.input_length,
            "output_length": metric.output_length,
            "history_length": metric.history_length,
        }),
    );
}

/// Emit an `llm_error` metric.
pub fn emit_llm_error(provider: &str, error: &str, duration: Duration) {
    emit(
        "llm_error",
        duration,
        json!({ "provider": provider, "error": error }),
    );
}

/// TTS stage fields.
pub struct TtsMetric<'a> {
    /// Voice id used.
    pub voice: &'a str,
    /// Length of the synthesized text, in characters.
    pub text_length: usize,
    /// Size of the synthesized audio, in bytes.
    pub audio_bytes: usize,
}

/// Emit a `tts_synthesis` metric.
pub fn emit_tts_synthesis(metric: &TtsMetric<'_>, duration: Duration) {
    emit(
        "tts_synthesis",
        duration,
        json!({
            "voice": metric.voice,
            "text_length": metric.text_length,
            "audio_bytes": metric.audio_bytes,
        }),
    );
}

/// Emit a `tts_error` metric.
pub fn emit_tts_error(error: &str, duration: Duration) {
    emit("tts_error", duration, json!({ "error": error }));
}

/// `pipeline_complete` fields.
pub struct PipelineCompleteMetric<'a> {
    /// Participant identity this turn belonged to.
    pub participant: &'a str,
    /// STT stage duration, in milliseconds.
    pub stt_ms: f64,
    /// LLM stage duration, in milliseconds.
    pub llm_ms: f64,
    /// TTS stage duration, in milliseconds.
    pub tts_ms: f64,
    /// Duration of the captured speech segment, in milliseconds.
    pub speech_duration_ms: u64,
}

/// Emit a `pipeline_complete` metric.
pub fn emit_pipeline_complete(metric: &PipelineCompleteMetric<'_>, duration: Duration) {
    emit(
        "pipeline_complete",
        duration,
        json!({
            "participant": metric.participant,
            "stt_ms": round2(metric.stt_ms),
            "llm_ms": round2(metric.llm_ms),
            "tts_ms": round2(metric.tts_ms),
            "speech_duration_ms": metric.speech_duration_ms,
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_to_two_decimals() {
        assert_eq!(round2(1.005 * 1.0), 1.0);
        assert_eq!(round2(12.3456), 12.35);
    }

    #[test]
    fn emit_produces_well_formed_metric_line_fields() {
        // emit() itself only logs through tracing; verify the JSON shape it
        // would build carries the required keys.
        let record = json!({
            "event": "stt_transcription",
            "duration_ms": round2(12.3456),
            "timestamp": unix_timestamp(),
        });
        assert!(record.get("event").is_some());
        assert!(record["duration_ms"].is_number());
        assert!(record["timestamp"].is_number());
    }
}
