//! Session runtime executor

use super::{Applied, Request, SessionSnapshot, SessionUpdate};
use crate::responder::{Responder, ResponderError};
use crate::state_machine::{transition, Effect, Event, SessionContext, SessionState, TransitionError};
use crate::transcript::{Message, Transcript};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Generic session runtime that can work with any responder implementation
pub struct SessionRuntime<R>
where
    R: Responder + ?Sized + 'static,
{
    context: SessionContext,
    state: SessionState,
    transcript: Transcript,
    responder: Arc<R>,
    reply_timeout: Duration,
    request_rx: mpsc::Receiver<Request>,
    /// Responder results come back on this channel
    reply_tx: mpsc::Sender<Event>,
    reply_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SessionUpdate>,
}

impl<R> SessionRuntime<R>
where
    R: Responder + ?Sized + 'static,
{
    pub(crate) fn new(
        context: SessionContext,
        responder: Arc<R>,
        reply_timeout: Duration,
        request_rx: mpsc::Receiver<Request>,
        broadcast_tx: broadcast::Sender<SessionUpdate>,
    ) -> Self {
        let (reply_tx, reply_rx) = mpsc::channel(8);
        let transcript = Transcript::seeded(context.welcome_message.clone());
        Self {
            context,
            state: SessionState::default(),
            transcript,
            responder,
            reply_timeout,
            request_rx,
            reply_tx,
            reply_rx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            session_id = %self.context.session_id,
            responder = %self.responder.name(),
            "Starting session runtime"
        );

        // Stops once every handle is gone; in-flight replies are dropped
        loop {
            tokio::select! {
                request = self.request_rx.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
                Some(event) = self.reply_rx.recv() => {
                    let _ = self.process_event(event);
                }
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::Dispatch { event, reply } => {
                let result = self.process_event(event);
                let _ = reply.send(result);
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn process_event(&mut self, event: Event) -> Result<Applied, TransitionError> {
        let event_name = event.name();
        if let Event::ReplyFailed { generation, error } = &event {
            tracing::warn!(
                session_id = %self.context.session_id,
                generation,
                error = %error,
                kind = ?error.kind,
                "Responder failed"
            );
        }

        // Pure state transition
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    event = event_name,
                    reason = %e,
                    "Event ignored"
                );
                return Err(e);
            }
        };

        let previous_status = self.state.status;
        self.state = result.new_state;
        if previous_status != self.state.status {
            tracing::debug!(
                session_id = %self.context.session_id,
                from = previous_status.name(),
                to = self.state.status.name(),
                generation = self.state.generation,
                history = self.state.history.len(),
                "Status changed"
            );
        }

        let mut appended = Vec::new();
        for effect in result.effects {
            if let Some(message) = self.execute_effect(effect) {
                appended.push(message);
            }
        }

        Ok(Applied {
            status: self.state.status,
            draft: self.state.draft.clone(),
            history_cursor: self.state.history.cursor(),
            appended,
        })
    }

    /// Execute an effect, returning the message it created if any
    fn execute_effect(&mut self, effect: Effect) -> Option<Message> {
        match effect {
            Effect::AppendMessage { sender, content } => {
                let message = self.transcript.append(sender, content);
                tracing::debug!(
                    session_id = %self.context.session_id,
                    sequence_id = message.sequence_id,
                    sender = message.sender.display_name(),
                    messages = self.transcript.len(),
                    "Message appended"
                );
                let _ = self.broadcast_tx.send(SessionUpdate::Message {
                    message: message.clone(),
                });
                Some(message)
            }

            Effect::ResetTranscript { seed } => {
                let seed = self.transcript.reset(seed);
                tracing::info!(session_id = %self.context.session_id, "Transcript cleared");
                let _ = self
                    .broadcast_tx
                    .send(SessionUpdate::Cleared { seed: seed.clone() });
                Some(seed)
            }

            Effect::RequestReply { generation, text } => {
                self.request_reply(generation, text);
                None
            }

            Effect::NotifyStatus => {
                let _ = self.broadcast_tx.send(SessionUpdate::Status {
                    status: self.state.status,
                });
                None
            }
        }
    }

    /// Spawn the responder call as a background task. Its result comes back
    /// tagged with `generation` so a clear in the meantime can discard it.
    fn request_reply(&self, generation: u64, text: String) {
        let responder = Arc::clone(&self.responder);
        let reply_tx = self.reply_tx.clone();
        let reply_timeout = self.reply_timeout;
        let session_id = self.context.session_id.clone();

        tokio::spawn(async move {
            tracing::debug!(session_id = %session_id, generation, "Requesting reply (background)");

            let event = match tokio::time::timeout(reply_timeout, responder.respond(&text)).await {
                Ok(Ok(reply)) => Event::ReplyReady {
                    generation,
                    text: reply,
                },
                Ok(Err(error)) => Event::ReplyFailed { generation, error },
                Err(_) => Event::ReplyFailed {
                    generation,
                    error: ResponderError::timeout(format!(
                        "No reply within {}ms",
                        reply_timeout.as_millis()
                    )),
                },
            };

            // The runtime may already be gone
            let _ = reply_tx.send(event).await;
        });
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.context.session_id.clone(),
            messages: self.transcript.messages().to_vec(),
            status: self.state.status,
            draft: self.state.draft.clone(),
            history: self.state.history.entries().iter().cloned().collect(),
            history_cursor: self.state.history.cursor(),
        }
    }
}
