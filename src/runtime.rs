//! Runtime for executing sessions
//!
//! Every session is driven by one [`SessionRuntime`] task. Callers talk to it
//! through a cloneable [`SessionHandle`]; requests are applied strictly one
//! at a time, so a session never sees two operations in parallel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::capabilities::Capabilities;
use crate::responder::Responder;
use crate::state_machine::{Event, SessionContext, SessionStatus, TransitionError};
use crate::transcript::Message;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

/// Default upper bound on a single responder call
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Updates pushed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// Full state, sent first on every stream
    Init { snapshot: SessionSnapshot },
    /// A message was appended
    Message { message: Message },
    /// The transcript was replaced by a single seed message
    Cleared { seed: Message },
    /// Status changed
    Status { status: SessionStatus },
}

impl SessionUpdate {
    /// Event name used on the wire
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionUpdate::Init { .. } => "init",
            SessionUpdate::Message { .. } => "message",
            SessionUpdate::Cleared { .. } => "cleared",
            SessionUpdate::Status { .. } => "status",
        }
    }
}

/// Point-in-time copy of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub status: SessionStatus,
    pub draft: String,
    pub history: Vec<String>,
    pub history_cursor: Option<usize>,
}

/// Outcome of an accepted event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub status: SessionStatus,
    pub draft: String,
    pub history_cursor: Option<usize>,
    /// Messages created while applying the event
    pub appended: Vec<Message>,
}

/// Errors returned by [`SessionHandle`]
#[derive(Debug, Error)]
pub enum SessionError {
    /// The event was ignored; the session is unchanged
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session runtime is no longer running")]
    Closed,
}

/// Requests accepted by a running session
pub(crate) enum Request {
    Dispatch {
        event: Event,
        reply: oneshot::Sender<Result<Applied, TransitionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    request_tx: mpsc::Sender<Request>,
    broadcast_tx: broadcast::Sender<SessionUpdate>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Apply an event and wait for its outcome
    pub async fn dispatch(&self, event: Event) -> Result<Applied, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request_tx
            .send(Request::Dispatch { event, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        let result = rx.await.map_err(|_| SessionError::Closed)?;
        Ok(result?)
    }

    pub async fn submit(&self, text: impl Into<String>) -> Result<Applied, SessionError> {
        self.dispatch(Event::submit(text)).await
    }

    pub async fn clear(&self) -> Result<Applied, SessionError> {
        self.dispatch(Event::Clear).await
    }

    pub async fn edit_draft(&self, text: impl Into<String>) -> Result<Applied, SessionError> {
        self.dispatch(Event::edit_draft(text)).await
    }

    pub async fn append_voice_transcript(
        &self,
        transcript: impl Into<String>,
    ) -> Result<Applied, SessionError> {
        self.dispatch(Event::voice_transcript(transcript)).await
    }

    pub async fn history_up(&self) -> Result<Applied, SessionError> {
        self.dispatch(Event::HistoryUp).await
    }

    pub async fn history_down(&self) -> Result<Applied, SessionError> {
        self.dispatch(Event::HistoryDown).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request_tx
            .send(Request::Snapshot { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Subscribe to session updates
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.broadcast_tx.subscribe()
    }
}

/// Start a session runtime in the background and return its handle
pub fn spawn_session<R>(
    context: SessionContext,
    responder: Arc<R>,
    reply_timeout: Duration,
) -> SessionHandle
where
    R: Responder + ?Sized + 'static,
{
    let (request_tx, request_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);
    let session_id = context.session_id.clone();

    let runtime = SessionRuntime::new(
        context,
        responder,
        reply_timeout,
        request_rx,
        broadcast_tx.clone(),
    );

    let id = session_id.clone();
    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!(session_id = %id, "Session runtime finished");
    });

    SessionHandle {
        session_id,
        request_tx,
        broadcast_tx,
    }
}

/// Per-session settings shared by all sessions of a manager
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub reply_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

/// A live session and the user who started it
struct OwnedSession {
    owner: String,
    handle: SessionHandle,
}

/// Manager for all live sessions
pub struct SessionManager {
    responder: Arc<dyn Responder>,
    capabilities: Arc<dyn Capabilities>,
    settings: SessionSettings,
    sessions: RwLock<HashMap<String, OwnedSession>>,
}

impl SessionManager {
    pub fn new(
        responder: Arc<dyn Responder>,
        capabilities: Arc<dyn Capabilities>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            responder,
            capabilities,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new session for `owner`, seeded with the welcome message
    pub async fn create(&self, owner: &str) -> SessionHandle {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context =
            SessionContext::new(&session_id).with_capabilities(self.capabilities.as_ref());

        let handle = spawn_session(
            context,
            Arc::clone(&self.responder),
            self.settings.reply_timeout,
        );

        self.sessions.write().await.insert(
            session_id.clone(),
            OwnedSession {
                owner: owner.to_string(),
                handle: handle.clone(),
            },
        );
        tracing::info!(session_id = %session_id, owner, "Session created");
        handle
    }

    /// Look up a session owned by `owner`
    pub async fn get(&self, session_id: &str, owner: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .filter(|session| session.owner == owner)
            .map(|session| session.handle.clone())
    }

    /// Forget a session owned by `owner`; its runtime stops once the last
    /// handle is dropped
    pub async fn close(&self, session_id: &str, owner: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|session| session.owner == owner)
        {
            sessions.remove(session_id);
            true
        } else {
            false
        }
    }

    /// Forget every session, returning how many were live
    pub async fn close_all(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
