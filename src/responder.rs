//! Reply generation
//!
//! The session core only knows the [`Responder`] trait. The bundled
//! implementation is a keyword-matching stub with simulated latency.

mod keyword;

pub use keyword::KeywordResponder;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Responder failure with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResponderError {
    pub kind: ResponderErrorKind,
    pub message: String,
}

impl ResponderError {
    pub fn new(kind: ResponderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Timeout, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Unavailable, message)
    }

    #[allow(dead_code)] // Constructor for API completeness
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Internal, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderErrorKind {
    /// No reply within the allotted time
    Timeout,
    /// Backend could not be reached
    Unavailable,
    /// Anything else
    Internal,
}

/// Turns user text into a reply
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce a reply for `text`
    async fn respond(&self, text: &str) -> Result<String, ResponderError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(&self, text: &str) -> Result<String, ResponderError> {
        (**self).respond(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for responders
pub struct LoggingResponder {
    inner: Arc<dyn Responder>,
    name: String,
}

impl LoggingResponder {
    pub fn new(inner: Arc<dyn Responder>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl Responder for LoggingResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponderError> {
        let start = std::time::Instant::now();
        let result = self.inner.respond(text).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    responder = %self.name,
                    duration_ms = %duration.as_millis(),
                    input_chars = text.chars().count(),
                    reply_chars = reply.chars().count(),
                    "Reply generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    responder = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Reply generation failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
