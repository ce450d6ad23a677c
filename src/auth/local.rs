//! In-process auth provider
//!
//! Keeps accounts and the single current session in memory. Passwords are
//! stored as salted SHA-256 digests.

use super::{AuthChange, AuthChangeKind, AuthError, AuthProvider, AuthSession, AuthUser};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

struct Account {
    user: AuthUser,
    salt: String,
    password_hash: String,
}

/// Memory-backed [`AuthProvider`]
pub struct LocalAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<AuthSession>>,
    session_ttl: Duration,
    changes: broadcast::Sender<AuthChange>,
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            session_ttl: DEFAULT_SESSION_TTL,
            changes,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Register an account without signing in
    pub fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&email) {
            return Err(AuthError::UserAlreadyExists);
        }

        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
        };
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let password_hash = hash_password(&salt, password);
        accounts.insert(
            email,
            Account {
                user: user.clone(),
                salt,
                password_hash,
            },
        );
        Ok(user)
    }

    fn start_session(&self, user: AuthUser) -> Result<AuthSession, AuthError> {
        let ttl = chrono::Duration::from_std(self.session_ttl)
            .map_err(|e| AuthError::Provider(format!("Invalid session lifetime: {e}")))?;
        let session = AuthSession {
            user,
            access_token: uuid::Uuid::new_v4().simple().to_string(),
            expires_at: Utc::now() + ttl,
        };
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        self.notify(AuthChangeKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    fn notify(&self, kind: AuthChangeKind, session: Option<AuthSession>) {
        // No subscribers is fine
        let _ = self.changes.send(AuthChange { kind, session });
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        {
            let mut current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            let expired = current
                .as_ref()
                .is_some_and(|session| session.expires_at <= Utc::now());
            if !expired {
                return Ok(current.clone());
            }
            *current = None;
        }
        tracing::info!("Auth session expired");
        self.notify(AuthChangeKind::SignedOut, None);
        Ok(None)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = {
            let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            let account = accounts.get(&email).ok_or(AuthError::InvalidCredentials)?;
            if hash_password(&account.salt, password) != account.password_hash {
                return Err(AuthError::InvalidCredentials);
            }
            account.user.clone()
        };
        tracing::info!(user = %user.email, "User signed in");
        self.start_session(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self.register(email, password)?;
        tracing::info!(user = %user.email, "User registered");
        self.start_session(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match previous {
            Some(session) => {
                tracing::info!(user = %session.user.email, "User signed out");
                self.notify(AuthChangeKind::SignedOut, None);
                Ok(())
            }
            None => Err(AuthError::SessionMissing),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

/// Trim and lowercase, rejecting anything not shaped like `local@domain.tld`
fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}
