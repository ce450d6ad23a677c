//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result. Transcript writes and responder calls are returned as effects for
//! the runtime to execute.

use super::{Effect, Event, SessionContext, SessionState, SessionStatus};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Reasons an event is ignored. A rejected event leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Still waiting for the previous reply")]
    ReplyPending,
    #[error("Reply for generation {generation} is stale")]
    StaleReply { generation: u64 },
    #[error("Voice input is not supported")]
    VoiceInputUnsupported,
}

impl TransitionError {
    /// Stable identifier for API clients
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::EmptyInput => "empty_input",
            TransitionError::ReplyPending => "reply_pending",
            TransitionError::StaleReply { .. } => "stale_reply",
            TransitionError::VoiceInputUnsupported => "voice_input_unsupported",
        }
    }
}

/// Pure transition function
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Submitting
        // ============================================================
        Event::Submit { .. } if state.status.is_awaiting_reply() => {
            Err(TransitionError::ReplyPending)
        }

        Event::Submit { text } => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            let generation = state.generation + 1;
            let mut next = state.clone();
            next.history.record(trimmed, context.history_capacity);
            next.draft.clear();
            next.generation = generation;
            next.status = SessionStatus::AwaitingReply { generation };

            Ok(TransitionResult::new(next)
                .with_effect(Effect::user_message(trimmed))
                .with_effect(Effect::NotifyStatus)
                .with_effect(Effect::RequestReply {
                    generation,
                    text: trimmed.to_string(),
                }))
        }

        // ============================================================
        // Replies
        // ============================================================
        Event::ReplyReady { generation, text } => {
            if !state.accepts_reply(generation) {
                return Err(TransitionError::StaleReply { generation });
            }
            Ok(settle(state)
                .with_effect(Effect::bot_message(text))
                .with_effect(Effect::NotifyStatus))
        }

        Event::ReplyFailed { generation, .. } => {
            if !state.accepts_reply(generation) {
                return Err(TransitionError::StaleReply { generation });
            }
            Ok(settle(state)
                .with_effect(Effect::bot_message(context.fallback_reply.clone()))
                .with_effect(Effect::NotifyStatus))
        }

        // ============================================================
        // Clearing
        // ============================================================
        Event::Clear => {
            let mut next = state.clone();
            next.generation = state.generation + 1;
            next.status = SessionStatus::Idle;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::ResetTranscript {
                    seed: context.cleared_message.clone(),
                })
                .with_effect(Effect::NotifyStatus))
        }

        // ============================================================
        // Draft and history
        // ============================================================
        Event::EditDraft { text } => {
            let mut next = state.clone();
            next.draft = text;
            next.history.reset_cursor();
            Ok(TransitionResult::new(next))
        }

        Event::VoiceTranscript { .. } if !context.voice_input => {
            Err(TransitionError::VoiceInputUnsupported)
        }

        Event::VoiceTranscript { transcript } => {
            let transcript = transcript.trim();
            let mut next = state.clone();
            if transcript.is_empty() {
                return Ok(TransitionResult::new(next));
            }
            if !next.draft.is_empty() {
                next.draft.push(' ');
            }
            next.draft.push_str(transcript);
            next.history.reset_cursor();
            Ok(TransitionResult::new(next))
        }

        Event::HistoryUp => {
            let mut next = state.clone();
            if let Some(navigation) = state.history.navigate_up() {
                next.history.apply(&navigation);
                next.draft = navigation.draft;
            }
            Ok(TransitionResult::new(next))
        }

        Event::HistoryDown => {
            let mut next = state.clone();
            let navigation = state.history.navigate_down();
            next.history.apply(&navigation);
            next.draft = navigation.draft;
            Ok(TransitionResult::new(next))
        }
    }
}

/// Return to idle after a reply settled
fn settle(state: &SessionState) -> TransitionResult {
    let mut next = state.clone();
    next.status = SessionStatus::Idle;
    TransitionResult::new(next)
}
