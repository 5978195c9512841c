//! Audio utilities: PCM conversion, resampling, level metering, and MP3 decoding.

pub mod codec;
pub mod pcm;

pub use codec::{decode_mp3_to_pcm16, frame_pcm16};
pub use pcm::{concat_i16, int16_to_f32, levels, resample_linear, AudioLevels};
