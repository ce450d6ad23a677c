//! Effects produced by state transitions

use crate::transcript::Sender;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the transcript
    AppendMessage { sender: Sender, content: String },

    /// Replace the whole transcript with a single bot seed message
    ResetTranscript { seed: String },

    /// Ask the responder for a reply (spawns as background task)
    RequestReply { generation: u64, text: String },

    /// Notify subscribers of the new status
    NotifyStatus,
}

impl Effect {
    pub fn user_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            content: content.into(),
        }
    }

    pub fn bot_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Bot,
            content: content.into(),
        }
    }
}
