//! ChatBot AI - conversational assistant service
//!
//! A Rust backend implementing a chat session state machine behind a small
//! HTTP/SSE API, with sign-in gating and conversation export.

mod api;
mod auth;
mod capabilities;
mod config;
mod export;
mod responder;
mod runtime;
mod state_machine;
mod transcript;

use api::{create_router, AppState};
use auth::{AuthGate, LocalAuthProvider};
use capabilities::Capabilities;
use config::AppConfig;
use responder::{KeywordResponder, LoggingResponder, Responder};
use runtime::{SessionManager, SessionSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatbot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env();
    tracing::info!(
        port = config.port,
        reply_timeout_secs = config.reply_timeout.as_secs(),
        voice_input = config.capabilities.voice_input,
        clipboard = config.capabilities.clipboard,
        "Configuration loaded"
    );

    // Identity
    let provider = Arc::new(LocalAuthProvider::new().with_session_ttl(config.session_ttl));
    if let Some(demo) = &config.demo_account {
        match provider.register(&demo.email, &demo.password) {
            Ok(user) => tracing::info!(user = %user.email, "Demo account registered"),
            Err(e) => tracing::warn!(error = %e, "Failed to register demo account"),
        }
    }
    let auth = Arc::new(AuthGate::new(provider));
    auth.initialize().await;
    tracing::info!(authenticated = auth.is_authenticated(), "Auth state loaded");
    let _watcher = auth.watch();

    // Responder
    let keyword = KeywordResponder::new().with_latency(config.min_latency, config.max_latency);
    let responder: Arc<dyn Responder> = Arc::new(LoggingResponder::new(Arc::new(keyword)));

    // Create application state
    let capabilities: Arc<dyn Capabilities> = Arc::new(config.capabilities);
    let sessions = Arc::new(SessionManager::new(
        responder,
        Arc::clone(&capabilities),
        SessionSettings {
            reply_timeout: config.reply_timeout,
        },
    ));
    let state = AppState::new(auth, sessions, capabilities);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("ChatBot AI server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
