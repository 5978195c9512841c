//! End-to-end scenarios for `ConversationPipeline`, driven through scripted
//! track/VAD doubles so turn-detection timing is deterministic: see
//! `tests/support/mod.rs` for the scripting mechanism.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};
use support::{
    clean_utterance_steps, fast_turn_config, frame_at, participant, recording_outbound,
    FailingLlm, FixedLlm, FixedTranscriber, RecordingRoom, ScriptStep, ScriptedTrack, ScriptedVad,
    SilentSynthesizer, APOLOGY_TEXT,
};
use turnwise::pipeline::ConversationPipeline;
use turnwise::vad::VadEventKind;

#[tokio::test]
async fn clean_turn_publishes_transcription_then_response() {
    let base = Instant::now();
    let (track, events) = ScriptedTrack::new(clean_utterance_steps(base));
    let vad = ScriptedVad::new(events);

    let room = Arc::new(RecordingRoom::default());
    let (outbound, _frames) = recording_outbound();

    let pipeline = Arc::new(ConversationPipeline::new(
        participant("alice"),
        "base".to_owned(),
        Arc::new(FixedTranscriber {
            text: "회의 시간이 언제예요".to_owned(),
        }),
        Arc::new(FixedLlm {
            reply: "회의는 오후 세 시입니다.".to_owned(),
        }),
        Arc::new(SilentSynthesizer),
        "ko-KR-SunHiNeural".to_owned(),
        fast_turn_config(),
    ));

    pipeline
        .run(Box::new(track), Box::new(vad), outbound, room.clone())
        .await;
    // `run_turn` is spawned detached from the debounce-commit branch; give it
    // a moment to finish after the track (and therefore `run`) ends.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let published = room.published.lock().unwrap().clone();
    assert_eq!(published.len(), 2, "expected one transcription + one response event, got {published:?}");

    let transcription: serde_json::Value = serde_json::from_str(&published[0]).unwrap();
    assert_eq!(transcription["type"], "transcription");
    assert_eq!(transcription["text"], "회의 시간이 언제예요");

    let response: serde_json::Value = serde_json::from_str(&published[1]).unwrap();
    assert_eq!(response["type"], "response");
    assert_eq!(response["text"], "회의는 오후 세 시입니다.");
}

#[tokio::test]
async fn short_cough_below_min_speech_is_dropped_silently() {
    let base = Instant::now();
    let steps = vec![
        ScriptStep {
            frame: frame_at(base, 0),
            event: Some(VadEventKind::StartOfSpeech),
            delay: Duration::ZERO,
        },
        ScriptStep {
            frame: frame_at(base, 20),
            event: Some(VadEventKind::EndOfSpeech),
            delay: Duration::ZERO,
        },
    ];
    let (track, events) = ScriptedTrack::new(steps);
    let vad = ScriptedVad::new(events);

    let room = Arc::new(RecordingRoom::default());
    let (outbound, _frames) = recording_outbound();

    let pipeline = Arc::new(ConversationPipeline::new(
        participant("bob"),
        "base".to_owned(),
        Arc::new(FixedTranscriber {
            text: "should never be called".to_owned(),
        }),
        Arc::new(FixedLlm {
            reply: "should never be called".to_owned(),
        }),
        Arc::new(SilentSynthesizer),
        "ko-KR-SunHiNeural".to_owned(),
        fast_turn_config(),
    ));

    pipeline
        .run(Box::new(track), Box::new(vad), outbound, room.clone())
        .await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(
        room.published.lock().unwrap().is_empty(),
        "a 40ms blip below min_speech_ms must never reach STT/LLM"
    );
}

#[tokio::test]
async fn brief_pause_merges_into_a_single_turn() {
    let base = Instant::now();
    let mut steps = Vec::new();
    // First span of speech: 8 frames, ends in EndOfSpeech (arms debounce).
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
    // Speech resumes 5ms later, well inside the 40ms debounce window:
    // cancels the pending commit and merges back into the same segment.
    steps.push(ScriptStep {
        frame: frame_at(base, 165),
        event: Some(VadEventKind::StartOfSpeech),
        delay: Duration::from_millis(5),
    });
    for i in 0..4u64 {
        steps.push(ScriptStep {
            frame: frame_at(base, 170 + i * 20),
            event: if i == 3 {
                Some(VadEventKind::EndOfSpeech)
            } else {
                None
            },
            delay: Duration::ZERO,
        });
    }
    // The second EndOfSpeech (at the synthetic 230ms mark) arms a debounce
    // deadline of 230ms + 40ms = 270ms after `base`; hold the track open well
    // past that before it ends, so this second commit actually fires.
    steps.push(ScriptStep {
        frame: frame_at(base, 500),
        event: None,
        delay: Duration::from_millis(350),
    });

    let (track, events) = ScriptedTrack::new(steps);
    let vad = ScriptedVad::new(events);

    let room = Arc::new(RecordingRoom::default());
    let (outbound, _frames) = recording_outbound();

    let pipeline = Arc::new(ConversationPipeline::new(
        participant("carol"),
        "base".to_owned(),
        Arc::new(FixedTranscriber {
            text: "한 번에 말한 문장".to_owned(),
        }),
        Arc::new(FixedLlm {
            reply: "네, 알겠습니다.".to_owned(),
        }),
        Arc::new(SilentSynthesizer),
        "ko-KR-SunHiNeural".to_owned(),
        fast_turn_config(),
    ));

    pipeline
        .run(Box::new(track), Box::new(vad), outbound, room.clone())
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let published = room.published.lock().unwrap().clone();
    assert_eq!(
        published.len(),
        2,
        "a debounce-window pause must merge into one turn, not two: {published:?}"
    );
}

#[tokio::test]
async fn llm_failure_substitutes_apology_and_still_publishes_response() {
    let base = Instant::now();
    let (track, events) = ScriptedTrack::new(clean_utterance_steps(base));
    let vad = ScriptedVad::new(events);

    let room = Arc::new(RecordingRoom::default());
    let (outbound, _frames) = recording_outbound();

    let pipeline = Arc::new(ConversationPipeline::new(
        participant("dave"),
        "base".to_owned(),
        Arc::new(FixedTranscriber {
            text: "오늘 날씨 어때요".to_owned(),
        }),
        Arc::new(FailingLlm {
            delay: Duration::ZERO,
        }),
        Arc::new(SilentSynthesizer),
        "ko-KR-SunHiNeural".to_owned(),
        fast_turn_config(),
    ));

    pipeline
        .run(Box::new(track), Box::new(vad), outbound, room.clone())
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let published = room.published.lock().unwrap().clone();
    assert_eq!(published.len(), 2);
    let response: serde_json::Value = serde_json::from_str(&published[1]).unwrap();
    assert_eq!(response["type"], "response");
    assert_eq!(response["text"], APOLOGY_TEXT);
}
