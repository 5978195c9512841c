//! Message types exchanged between the pipeline and the client data channel,
//! and the bounded per-participant dialogue history.

use crate::llm::ChatMessage;
use serde::Serialize;
use std::collections::VecDeque;

/// Maximum number of messages kept in a participant's dialogue history
/// (10 exchanges = 20 messages).
pub const DIALOGUE_HISTORY_CAP: usize = 20;

/// An outbound data-channel event, published to the room's reliable channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataChannelEvent {
    /// Sent right after STT completes.
    Transcription {
        /// The recognized text.
        text: String,
    },
    /// Sent right after the LLM reply (or apology substitute) is ready.
    Response {
        /// The reply text.
        text: String,
    },
}

impl DataChannelEvent {
    /// Serialize to the UTF-8 JSON bytes published over the data channel.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("DataChannelEvent always serializes")
    }
}

/// Bounded dialogue history for one participant: keeps at most
/// [`DIALOGUE_HISTORY_CAP`] messages, trimmed from the head on overflow.
#[derive(Debug, Clone, Default)]
pub struct DialogueHistory {
    messages: VecDeque<ChatMessage>,
}

impl DialogueHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, trimming the oldest entries past the cap.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > DIALOGUE_HISTORY_CAP {
            self.messages.pop_front();
        }
    }

    /// The messages in chronological order.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
