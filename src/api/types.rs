//! API request and response types

use crate::auth::AuthUser;
use crate::export::ExportFormat;
use crate::runtime::Applied;
use crate::state_machine::{SessionStatus, TransitionError};
use crate::transcript::Message;
use serde::{Deserialize, Serialize};

/// Email and password for sign-in and sign-up
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Current identity, `user` is null when signed out
#[derive(Debug, Serialize)]
pub struct AuthSessionResponse {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: AuthUser,
}

/// Sign-out always succeeds; `warning` carries any provider complaint
#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub signed_out: bool,
    pub warning: Option<String>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

/// Response for a submitted message
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// The user message as appended to the log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl SubmitResponse {
    pub fn accepted(applied: Applied) -> Self {
        Self {
            accepted: true,
            reason: None,
            message: applied.appended.into_iter().next(),
        }
    }

    pub fn rejected(reason: &TransitionError) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.code()),
            message: None,
        }
    }
}

/// Request to replace the draft
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

/// Request to append a recognized voice transcript
#[derive(Debug, Deserialize)]
pub struct VoiceTranscriptRequest {
    pub transcript: String,
}

/// Response for clear, draft and history actions
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    pub history_cursor: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appended: Vec<Message>,
}

impl ActionResponse {
    pub fn accepted(applied: Applied) -> Self {
        Self {
            accepted: true,
            reason: None,
            status: Some(applied.status),
            draft: Some(applied.draft),
            history_cursor: applied.history_cursor,
            appended: applied.appended,
        }
    }

    pub fn rejected(reason: &TransitionError) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.code()),
            status: None,
            draft: None,
            history_cursor: None,
            appended: Vec::new(),
        }
    }
}

/// Query for export downloads
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    pub file_name: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
