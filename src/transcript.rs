//! Conversation transcript
//!
//! The ordered message log of a session. Messages are only ever appended,
//! except for the whole-log replacement performed on seed and clear.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Label used in human-readable exports
    pub fn display_name(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "ChatBot AI",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Per-session ordering key; strictly increasing, survives clears
    pub sequence_id: u64,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

/// Ordered message log for one session
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    next_sequence_id: u64,
}

impl Transcript {
    /// Create a transcript holding a single bot seed message
    pub fn seeded(seed: impl Into<String>) -> Self {
        let mut transcript = Self {
            messages: Vec::new(),
            next_sequence_id: 1,
        };
        transcript.append(Sender::Bot, seed);
        transcript
    }

    /// Append a message and return a copy of it
    pub fn append(&mut self, sender: Sender, content: impl Into<String>) -> Message {
        let message = Message {
            id: uuid::Uuid::now_v7().to_string(),
            sequence_id: self.next_sequence_id,
            content: content.into(),
            sender,
            timestamp: now_millis(),
        };
        self.next_sequence_id += 1;
        self.messages.push(message.clone());
        message
    }

    /// Replace the whole log with a fresh bot seed message
    pub fn reset(&mut self, seed: impl Into<String>) -> Message {
        self.messages.clear();
        self.append(Sender::Bot, seed)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Current instant at millisecond precision.
///
/// Export writes instants with millisecond precision, so anything finer would
/// not survive an export/import cycle.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
