//! Authentication gating
//!
//! Identity is owned by an [`AuthProvider`]. [`AuthGate`] caches the current
//! session for the rest of the service and applies the sign-out policy:
//! local identity is always cleared, remote failures only produce a warning.

mod local;

pub use local::LocalAuthProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

/// Warning reported when the session lookup itself failed during sign-out
pub const LOCAL_SIGN_OUT_WARNING: &str = "Signed out locally due to session error";

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// An active identity session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Auth failures. Display strings are shown to users verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("User already registered")]
    UserAlreadyExists,
    #[error("Unable to validate email address: invalid format")]
    InvalidEmail,
    #[error("Password should be at least {min} characters.")]
    WeakPassword { min: usize },
    #[error("Auth session missing!")]
    SessionMissing,
    #[error("{0}")]
    Provider(String),
}

/// What kind of identity change happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeKind {
    SignedIn,
    SignedOut,
    #[allow(dead_code)] // Sent by providers with expiring tokens
    TokenRefreshed,
}

/// Identity change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub kind: AuthChangeKind,
    pub session: Option<AuthSession>,
}

/// External identity provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, if any
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Listen for identity changes
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// Result of a sign-out. Sign-out never fails; it may carry a warning.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SignOutOutcome {
    pub warning: Option<String>,
}

/// Cached identity state in front of an [`AuthProvider`]
pub struct AuthGate {
    provider: Arc<dyn AuthProvider>,
    current: RwLock<Option<AuthSession>>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
        }
    }

    /// Load the provider's session at startup. Errors count as signed out.
    pub async fn initialize(&self) -> Option<AuthUser> {
        let session = match self.provider.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load initial auth session");
                None
            }
        };
        self.set_session(session);
        self.current_user()
    }

    /// The cached session. An expired session is dropped and reads as none.
    pub fn current_session(&self) -> Option<AuthSession> {
        let session = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        if session.expires_at > Utc::now() {
            return Some(session);
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // A fresh sign-in may have replaced it in the meantime
        if current.as_ref() == Some(&session) {
            tracing::info!(user = %session.user.email, "Auth session expired");
            *current = None;
        }
        current
            .clone()
            .filter(|session| session.expires_at > Utc::now())
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current_session().map(|session| session.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }

    /// Apply a provider notification. A change without a session is a
    /// completed sign-out.
    pub fn apply_change(&self, change: &AuthChange) {
        tracing::info!(
            event = ?change.kind,
            user = change.session.as_ref().map_or("no user", |s| s.user.email.as_str()),
            "Auth state change"
        );
        self.set_session(change.session.clone());
    }

    /// Follow provider notifications until the provider goes away
    pub fn watch(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut changes = self.provider.subscribe();
        let gate = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => gate.apply_change(&change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth change listener lagged, resyncing");
                        gate.initialize().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Sign in; failures are returned as-is so the caller can retry
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        let user = session.user.clone();
        self.set_session(Some(session));
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let session = self.provider.sign_up(email, password).await?;
        let user = session.user.clone();
        self.set_session(Some(session));
        Ok(user)
    }

    /// Sign out. Local identity is cleared whatever the provider says.
    pub async fn sign_out(&self) -> SignOutOutcome {
        let outcome = match self.provider.get_session().await {
            Ok(None) => SignOutOutcome::default(),
            Ok(Some(_)) => match self.provider.sign_out().await {
                Ok(()) => SignOutOutcome::default(),
                Err(e) => {
                    tracing::warn!(error = %e, "Signout completed with warning");
                    SignOutOutcome {
                        warning: Some(e.to_string()),
                    }
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed during signout");
                SignOutOutcome {
                    warning: Some(LOCAL_SIGN_OUT_WARNING.to_string()),
                }
            }
        };
        self.set_session(None);
        outcome
    }

    fn set_session(&self, session: Option<AuthSession>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}
