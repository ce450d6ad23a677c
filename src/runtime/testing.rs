//! Mock implementations for testing
//!
//! These mocks drive a real session runtime without simulated latency.

use super::{spawn_session, SessionHandle, SessionUpdate};
use crate::responder::{Responder, ResponderError};
use crate::state_machine::{SessionContext, SessionStatus};
use crate::transcript::{Message, Sender};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Mock Responder
// ============================================================================

/// Responder that returns queued results in order
pub struct MockResponder {
    replies: Mutex<VecDeque<Result<String, ResponderError>>>,
    /// Record of every input received
    pub inputs: Mutex<Vec<String>>,
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResponder {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: ResponderError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    fn next_reply(&self, text: &str) -> Result<String, ResponderError> {
        self.inputs.lock().unwrap().push(text.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ResponderError::unavailable("No mock reply queued")))
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponderError> {
        self.next_reply(text)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Delayed Mock Responder (for in-flight testing)
// ============================================================================

/// Mock responder that waits before answering
pub struct DelayedMockResponder {
    inner: MockResponder,
    delay: Duration,
    /// Notified when a request starts
    pub request_started: Arc<Notify>,
}

impl DelayedMockResponder {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockResponder::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_inputs(&self) -> Vec<String> {
        self.inner.recorded_inputs()
    }
}

#[async_trait]
impl Responder for DelayedMockResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponderError> {
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply(text)
    }

    fn name(&self) -> &str {
        "delayed-mock"
    }
}

// ============================================================================
// Test Session Builder
// ============================================================================

/// A running session plus a subscription opened before any event
pub struct TestSession<R: Responder + 'static> {
    pub handle: SessionHandle,
    pub updates: broadcast::Receiver<SessionUpdate>,
    pub responder: Arc<R>,
}

impl TestSession<MockResponder> {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> TestSessionBuilder<MockResponder> {
        TestSessionBuilder {
            responder: MockResponder::new(),
            reply_timeout: Duration::from_secs(5),
            voice_input: false,
        }
    }
}

pub struct TestSessionBuilder<R> {
    responder: R,
    reply_timeout: Duration,
    voice_input: bool,
}

impl<R: Responder + 'static> TestSessionBuilder<R> {
    pub fn responder<R2: Responder + 'static>(self, responder: R2) -> TestSessionBuilder<R2> {
        TestSessionBuilder {
            responder,
            reply_timeout: self.reply_timeout,
            voice_input: self.voice_input,
        }
    }

    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn voice_input(mut self, enabled: bool) -> Self {
        self.voice_input = enabled;
        self
    }

    pub fn build(self) -> TestSession<R> {
        let mut context = SessionContext::new("test-session");
        context.voice_input = self.voice_input;

        let responder = Arc::new(self.responder);
        let handle = spawn_session(context, Arc::clone(&responder), self.reply_timeout);
        let updates = handle.subscribe();

        TestSession {
            handle,
            updates,
            responder,
        }
    }
}

impl<R: Responder + 'static> TestSession<R> {
    /// Wait for the next bot message
    pub async fn wait_for_reply(&mut self, timeout: Duration) -> Option<Message> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.updates.recv()).await {
                Ok(Ok(SessionUpdate::Message { message })) if message.sender == Sender::Bot => {
                    return Some(message)
                }
                Ok(Ok(_)) => continue,
                Ok(Err(_)) | Err(_) => return None,
            }
        }
    }

    /// Wait until the session reports idle
    pub async fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.updates.recv()).await {
                Ok(Ok(SessionUpdate::Status {
                    status: SessionStatus::Idle,
                })) => return true,
                Ok(Ok(_)) => continue,
                Ok(Err(_)) | Err(_) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::StaticCapabilities;
    use crate::responder::KeywordResponder;
    use crate::runtime::{SessionError, SessionManager, SessionSettings};
    use crate::state_machine::history::HISTORY_CAPACITY;
    use crate::state_machine::state::{CLEARED_MESSAGE, FALLBACK_REPLY, WELCOME_MESSAGE};
    use crate::state_machine::TransitionError;

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_new_session_is_seeded() {
        let session = TestSession::new().build();
        let snapshot = session.handle.snapshot().await.unwrap();

        assert_eq!(snapshot.session_id, "test-session");
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].sender, Sender::Bot);
        assert_eq!(snapshot.messages[0].content, WELCOME_MESSAGE);
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test]
    async fn test_hello_gets_keyword_reply() {
        let responder = KeywordResponder::new().with_latency(Duration::ZERO, Duration::ZERO);
        let mut session = TestSession::new().responder(responder).build();

        session.handle.submit("hello").await.unwrap();
        let reply = session.wait_for_reply(WAIT).await.unwrap();
        assert_eq!(
            reply.content,
            "Hello! I'm your AI assistant. How can I help you today?"
        );
        assert!(session.wait_for_idle(WAIT).await);

        let snapshot = session.handle.snapshot().await.unwrap();
        let senders: Vec<_> = snapshot.messages.iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::Bot, Sender::User, Sender::Bot]);
        assert_eq!(snapshot.messages[1].content, "hello");
        assert_eq!(snapshot.status, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_bot() {
        let responder = DelayedMockResponder::new(Duration::from_millis(100));
        responder.queue_reply("reply");
        let mut session = TestSession::new().responder(responder).build();

        let applied = session.handle.submit("  question  ").await.unwrap();
        assert!(applied.status.is_awaiting_reply());
        assert_eq!(applied.appended.len(), 1);
        assert_eq!(applied.appended[0].content, "question");

        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 2);
        assert!(snapshot.status.is_awaiting_reply());

        session.wait_for_reply(WAIT).await.unwrap();
        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages[2].content, "reply");
        assert!(snapshot
            .messages
            .windows(2)
            .all(|w| w[0].sequence_id < w[1].sequence_id));
        assert_eq!(session.responder.recorded_inputs(), vec!["question"]);
    }

    #[tokio::test]
    async fn test_responder_failure_appends_fallback() {
        let mut session = TestSession::new().build();
        session
            .responder
            .queue_error(ResponderError::unavailable("backend down"));

        session.handle.submit("hi").await.unwrap();
        let reply = session.wait_for_reply(WAIT).await.unwrap();
        assert_eq!(reply.content, FALLBACK_REPLY);
        assert!(session.wait_for_idle(WAIT).await);

        // Input is accepted again
        session.responder.queue_reply("back");
        session.handle.submit("again").await.unwrap();
        assert_eq!(session.wait_for_reply(WAIT).await.unwrap().content, "back");
    }

    #[tokio::test]
    async fn test_reply_timeout_appends_fallback() {
        let responder = DelayedMockResponder::new(Duration::from_secs(10));
        let mut session = TestSession::new()
            .responder(responder)
            .reply_timeout(Duration::from_millis(50))
            .build();

        session.handle.submit("slow").await.unwrap();
        let reply = session.wait_for_reply(WAIT).await.unwrap();
        assert_eq!(reply.content, FALLBACK_REPLY);

        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn test_empty_submit_is_ignored() {
        let session = TestSession::new().build();

        for text in ["", "   ", "\n\t"] {
            let err = session.handle.submit(text).await.unwrap_err();
            assert!(matches!(
                err,
                SessionError::Rejected(TransitionError::EmptyInput)
            ));
        }

        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 1);
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert!(session.responder.recorded_inputs().is_empty());
    }

    #[tokio::test]
    async fn test_submit_while_awaiting_is_ignored() {
        let responder = DelayedMockResponder::new(Duration::from_millis(100));
        responder.queue_reply("first reply");
        let mut session = TestSession::new().responder(responder).build();

        session.handle.submit("first").await.unwrap();
        let err = session.handle.submit("second").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Rejected(TransitionError::ReplyPending)
        ));

        session.wait_for_reply(WAIT).await.unwrap();
        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.history, vec!["first"]);
        assert_eq!(session.responder.recorded_inputs(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_concurrent_submits_accept_exactly_one() {
        let responder = DelayedMockResponder::new(Duration::from_millis(100));
        let session = TestSession::new().responder(responder).build();
        let other = session.handle.clone();

        let (a, b) = tokio::join!(session.handle.submit("a"), other.submit("b"));
        assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);

        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_reply() {
        let responder = DelayedMockResponder::new(Duration::from_millis(150));
        responder.queue_reply("stale");
        responder.queue_reply("fresh");
        let started = Arc::clone(&responder.request_started);
        let mut session = TestSession::new().responder(responder).build();

        let notified = started.notified();
        session.handle.submit("first").await.unwrap();
        notified.await;

        let applied = session.handle.clear().await.unwrap();
        assert_eq!(applied.status, SessionStatus::Idle);
        assert_eq!(applied.appended.len(), 1);
        assert_eq!(applied.appended[0].content, CLEARED_MESSAGE);

        // Let the stale reply arrive
        tokio::time::sleep(Duration::from_millis(400)).await;
        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].content, CLEARED_MESSAGE);
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert_eq!(snapshot.history, vec!["first"]);

        // A new exchange still works after the discard
        while session.updates.try_recv().is_ok() {}
        session.handle.submit("second").await.unwrap();
        let reply = session.wait_for_reply(WAIT).await.unwrap();
        assert_eq!(reply.content, "fresh");
        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_clear_keeps_sequence_ids_increasing() {
        let mut session = TestSession::new().build();
        session.responder.queue_reply("ok");
        session.handle.submit("hi").await.unwrap();
        let reply = session.wait_for_reply(WAIT).await.unwrap();

        let applied = session.handle.clear().await.unwrap();
        assert!(applied.appended[0].sequence_id > reply.sequence_id);
    }

    #[tokio::test]
    async fn test_history_is_capped_after_many_sends() {
        let mut session = TestSession::new().build();

        for i in 0..=HISTORY_CAPACITY {
            session.handle.submit(format!("msg {i}")).await.unwrap();
            assert!(session.wait_for_reply(WAIT).await.is_some());
        }

        let snapshot = session.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.history.len(), HISTORY_CAPACITY);
        assert_eq!(snapshot.history[0], format!("msg {HISTORY_CAPACITY}"));
        assert!(!snapshot.history.iter().any(|entry| entry == "msg 0"));
    }

    #[tokio::test]
    async fn test_history_navigation_through_handle() {
        let mut session = TestSession::new().build();
        for text in ["a", "b"] {
            session.handle.submit(text).await.unwrap();
            session.wait_for_reply(WAIT).await.unwrap();
        }

        let h = &session.handle;
        assert_eq!(h.history_up().await.unwrap().draft, "b");
        assert_eq!(h.history_up().await.unwrap().draft, "a");
        let applied = h.history_up().await.unwrap();
        assert_eq!((applied.draft.as_str(), applied.history_cursor), ("a", Some(1)));

        assert_eq!(h.history_down().await.unwrap().draft, "b");
        let applied = h.history_down().await.unwrap();
        assert_eq!((applied.draft.as_str(), applied.history_cursor), ("", None));
    }

    #[tokio::test]
    async fn test_editing_draft_resets_cursor() {
        let mut session = TestSession::new().build();
        session.handle.submit("a").await.unwrap();
        session.wait_for_reply(WAIT).await.unwrap();

        session.handle.history_up().await.unwrap();
        let applied = session.handle.edit_draft("typed").await.unwrap();
        assert_eq!(applied.draft, "typed");
        assert_eq!(applied.history_cursor, None);
    }

    #[tokio::test]
    async fn test_voice_transcript_requires_capability() {
        let session = TestSession::new().build();
        let err = session
            .handle
            .append_voice_transcript("spoken")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Rejected(TransitionError::VoiceInputUnsupported)
        ));

        let session = TestSession::new().voice_input(true).build();
        session.handle.edit_draft("typed").await.unwrap();
        let applied = session
            .handle
            .append_voice_transcript(" spoken words ")
            .await
            .unwrap();
        assert_eq!(applied.draft, "typed spoken words");
    }

    #[tokio::test]
    async fn test_manager_tracks_sessions() {
        let mock = Arc::new(MockResponder::new());
        let manager = SessionManager::new(
            mock,
            Arc::new(StaticCapabilities::default()),
            SessionSettings::default(),
        );

        let first = manager.create("user-a").await;
        let second = manager.create("user-a").await;
        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(manager.len().await, 2);
        assert!(manager.get(first.session_id(), "user-a").await.is_some());

        assert!(manager.close(first.session_id(), "user-a").await);
        assert!(manager.get(first.session_id(), "user-a").await.is_none());
        assert_eq!(manager.close_all().await, 1);
        assert_eq!(manager.len().await, 0);
    }

    #[tokio::test]
    async fn test_manager_hides_sessions_of_other_owners() {
        let manager = SessionManager::new(
            Arc::new(MockResponder::new()),
            Arc::new(StaticCapabilities::default()),
            SessionSettings::default(),
        );

        let session = manager.create("user-a").await;
        assert!(manager.get(session.session_id(), "user-b").await.is_none());
        assert!(!manager.close(session.session_id(), "user-b").await);
        assert_eq!(manager.len().await, 1);
        assert!(manager.get(session.session_id(), "user-a").await.is_some());
    }
}
