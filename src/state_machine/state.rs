//! Session state types

use super::history::{InputHistory, HISTORY_CAPACITY};
use crate::capabilities::Capabilities;
use serde::{Deserialize, Serialize};

/// Bot message every new session starts with
pub const WELCOME_MESSAGE: &str = "Hello! I'm ChatBot AI, your intelligent assistant. I'm here to help you with anything you need. How can I assist you today?";

/// Bot message that replaces the log on clear
pub const CLEARED_MESSAGE: &str =
    "Chat cleared! I'm ready to help you with anything new. What would you like to talk about?";

/// Bot message appended when the responder fails
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble responding right now. Please try again in a moment.";

// ============================================================================
// Session Status
// ============================================================================

/// Whether a reply is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Ready for input, no reply outstanding
    #[default]
    Idle,

    /// A user message was sent and its reply has not settled yet
    AwaitingReply {
        /// Generation captured when the message was submitted
        generation: u64,
    },
}

impl SessionStatus {
    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self, SessionStatus::AwaitingReply { .. })
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::AwaitingReply { .. } => "awaiting_reply",
        }
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Mutable part of a session that the transition function rewrites.
///
/// The message log lives in the runtime's transcript and is only changed
/// through effects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Epoch counter, bumped by every accepted submit and every clear.
    /// Replies tagged with any other value are stale.
    pub generation: u64,
    pub history: InputHistory,
    /// Current composer text
    pub draft: String,
}

impl SessionState {
    /// Whether a reply for `generation` is still wanted
    pub fn accepts_reply(&self, generation: u64) -> bool {
        matches!(
            self.status,
            SessionStatus::AwaitingReply { generation: pending } if pending == generation
        )
    }
}

// ============================================================================
// Session Context
// ============================================================================

/// Immutable configuration of a session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub welcome_message: String,
    pub cleared_message: String,
    pub fallback_reply: String,
    pub history_capacity: usize,
    /// Whether voice transcripts can reach this session
    pub voice_input: bool,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            welcome_message: WELCOME_MESSAGE.to_string(),
            cleared_message: CLEARED_MESSAGE.to_string(),
            fallback_reply: FALLBACK_REPLY.to_string(),
            history_capacity: HISTORY_CAPACITY,
            voice_input: false,
        }
    }

    /// Take capability flags from the host environment
    pub fn with_capabilities(mut self, capabilities: &dyn Capabilities) -> Self {
        self.voice_input = capabilities.supports_voice_input();
        self
    }
}
