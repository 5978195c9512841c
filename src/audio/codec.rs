//! MP3 -> PCM decoding and playback framing.

use crate::audio::pcm::resample_linear;
use crate::error::{AgentError, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Output sample rate for decoded TTS playback audio.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Number of samples per 20ms playback frame at 24kHz mono.
pub const PLAYBACK_FRAME_SAMPLES: usize = 480;

/// Decode an MP3 byte buffer to mono int16 PCM at [`PLAYBACK_SAMPLE_RATE`].
///
/// # Errors
///
/// Returns [`AgentError::MediaDecode`] if the bytes cannot be probed,
/// decoded, or contain no audio track.
pub fn decode_mp3_to_pcm16(mp3_bytes: &[u8]) -> Result<Vec<i16>> {
    let cursor = Cursor::new(mp3_bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AgentError::MediaDecode(format!("failed to probe MP3 stream: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AgentError::MediaDecode("no default audio track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| AgentError::MediaDecode("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AgentError::MediaDecode(format!("failed to create decoder: {e}")))?;

    let mut mono: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(AgentError::MediaDecode(format!("read error: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(AgentError::MediaDecode(format!("decode error: {e}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();

        let needs_new = match sample_buf.as_ref() {
            Some(b) => b.capacity() < decoded.frames() as usize * channels,
            None => true,
        };
        if needs_new {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.frames() as u64, spec));
        }
        let buf = sample_buf
            .as_mut()
            .expect("sample_buf initialized above");
        buf.copy_interleaved_ref(decoded);
        let data = buf.samples();

        if channels <= 1 {
            mono.extend_from_slice(data);
        } else {
            for frame in data.chunks_exact(channels) {
                let sum: f32 = frame.iter().sum();
                mono.push(sum / channels as f32);
            }
        }
    }

    let resampled = if source_rate == PLAYBACK_SAMPLE_RATE {
        mono
    } else {
        resample_linear(&mono, source_rate, PLAYBACK_SAMPLE_RATE)
    };

    Ok(resampled
        .into_iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect())
}

/// Chunk PCM samples into fixed-size playback frames, zero-padding the final
/// short frame.
pub fn frame_pcm16(samples: &[i16], frame_len: usize) -> Vec<Vec<i16>> {
    if frame_len == 0 {
        return Vec::new();
    }
    samples
        .chunks(frame_len)
        .map(|chunk| {
            let mut frame = chunk.to_vec();
            frame.resize(frame_len, 0);
            frame
        })
        .collect()
}
