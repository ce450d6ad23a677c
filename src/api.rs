//! HTTP API for the chat service
//!
//! Identity, session actions, live updates over SSE and export downloads.

mod handlers;
mod sse;
mod types;


pub use handlers::create_router;

use crate::auth::AuthGate;
use crate::capabilities::Capabilities;
use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGate>,
    pub sessions: Arc<SessionManager>,
    pub capabilities: Arc<dyn Capabilities>,
}

impl AppState {
    pub fn new(
        auth: Arc<AuthGate>,
        sessions: Arc<SessionManager>,
        capabilities: Arc<dyn Capabilities>,
    ) -> Self {
        Self {
            auth,
            sessions,
            capabilities,
        }
    }
}
