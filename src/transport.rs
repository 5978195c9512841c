//! Room/transport SDK surface consumed by the agent.
//!
//! The conversation pipeline is transport-agnostic: it depends only on the
//! [`RoomTransport`] trait and the raw frame/event types below. A concrete
//! transport (e.g. a LiveKit room client) implements this trait; the pipeline
//! never talks to a transport SDK directly.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Instant;

/// A chunk of raw PCM audio delivered by the transport.
///
/// Samples are signed 16-bit, interleaved if `channels > 1`.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (1 = mono).
    pub channels: u16,
    /// Interleaved int16 PCM samples.
    pub samples: Vec<i16>,
    /// Monotonic capture timestamp, used for prefix-buffer aging.
    pub captured_at: Instant,
}

impl AudioFrame {
    /// Duration of this frame in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / u64::from(self.channels);
        frames * 1000 / u64::from(self.sample_rate)
    }
}

/// Track publish source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    /// The track represents a synthesized/microphone-equivalent voice source.
    Microphone,
}

/// Options passed when publishing an outbound track.
#[derive(Debug, Clone, Copy)]
pub struct PublishOptions {
    /// Declared source of the published track.
    pub source: TrackSource,
}

/// A remote participant's identity, as surfaced by the transport.
pub type ParticipantId = String;

/// A handle to a subscribed remote audio track.
///
/// Implementations hide the underlying transport SDK track object; the
/// pipeline only needs to be able to read an [`AudioFrame`] stream from it.
#[async_trait]
pub trait RemoteAudioTrack: Send {
    /// Read the next frame, or `None` when the track has ended.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Transport`] if the underlying
    /// stream errors.
    async fn next_frame(&mut self) -> Result<Option<AudioFrame>>;
}

/// A handle to the agent's outbound audio source.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Publish one frame of audio to the outbound track.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Transport`] if the publish fails.
    async fn capture_frame(&self, frame: AudioFrame) -> Result<()>;
}

/// A notification that a remote participant's audio track was subscribed.
pub struct TrackSubscription {
    /// The subscribed remote audio track.
    pub track: Box<dyn RemoteAudioTrack>,
    /// Identity of the participant the track belongs to.
    pub participant: ParticipantId,
}

/// The room/transport SDK surface the agent depends on.
///
/// This trait intentionally mirrors a LiveKit-style room client: connect
/// with audio-only subscription, publish an outbound track, publish
/// reliable data-channel messages, and observe `track_subscribed` events.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Connect to the assigned room with audio-only subscription.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Transport`] if the connection fails.
    async fn connect(&self) -> Result<()>;

    /// Create the outbound audio source and publish it as a track.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Transport`] if publishing fails.
    async fn publish_audio_track(
        &self,
        label: &str,
        options: PublishOptions,
    ) -> Result<Box<dyn AudioSource>>;

    /// Publish a reliable data-channel message (UTF-8 JSON bytes).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AgentError::Transport`] if the publish fails.
    async fn publish_data(&self, bytes: &[u8], reliable: bool) -> Result<()>;

    /// Await the next `track_subscribed` event.
    ///
    /// Returns `None` once the room connection is closed and no further
    /// tracks will be subscribed.
    async fn next_track_subscribed(&self) -> Option<TrackSubscription>;
}
