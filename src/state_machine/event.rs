//! Events that can occur in a session

use crate::responder::ResponderError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit {
        text: String,
    },
    Clear,
    EditDraft {
        text: String,
    },
    VoiceTranscript {
        transcript: String,
    },
    HistoryUp,
    HistoryDown,

    // Responder events
    ReplyReady {
        generation: u64,
        text: String,
    },
    ReplyFailed {
        generation: u64,
        error: ResponderError,
    },
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Event::Submit { text: text.into() }
    }

    pub fn edit_draft(text: impl Into<String>) -> Self {
        Event::EditDraft { text: text.into() }
    }

    pub fn voice_transcript(transcript: impl Into<String>) -> Self {
        Event::VoiceTranscript {
            transcript: transcript.into(),
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit",
            Event::Clear => "clear",
            Event::EditDraft { .. } => "edit_draft",
            Event::VoiceTranscript { .. } => "voice_transcript",
            Event::HistoryUp => "history_up",
            Event::HistoryDown => "history_down",
            Event::ReplyReady { .. } => "reply_ready",
            Event::ReplyFailed { .. } => "reply_failed",
        }
    }
}
