//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ActionResponse, AuthSessionResponse, CredentialsRequest, DraftRequest, ErrorResponse,
    ExportQuery, SignOutResponse, SubmitRequest, SubmitResponse, UserResponse,
    VoiceTranscriptRequest,
};
use super::AppState;
use crate::auth::AuthUser;
use crate::capabilities::CapabilityReport;
use crate::export::{default_file_name, render_json, render_text, ExportFormat};
use crate::runtime::{Applied, SessionError, SessionHandle, SessionUpdate};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Local, Utc};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Identity
        .route("/api/auth/session", get(get_auth_session))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-out", post(sign_out))
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(close_session))
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/messages", post(submit_message))
        .route("/api/sessions/:id/clear", post(clear_session))
        .route("/api/sessions/:id/draft", put(edit_draft))
        .route("/api/sessions/:id/draft/voice", post(append_voice_transcript))
        .route("/api/sessions/:id/history/up", post(history_up))
        .route("/api/sessions/:id/history/down", post(history_down))
        // Export
        .route("/api/sessions/:id/export", get(export_session))
        // Host info
        .route("/api/capabilities", get(get_capabilities))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Identity
// ============================================================

async fn get_auth_session(State(state): State<AppState>) -> Json<AuthSessionResponse> {
    let user = state.auth.current_user();
    Json(AuthSessionResponse {
        authenticated: user.is_some(),
        user,
    })
}

async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .auth
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;
    Ok(Json(UserResponse { user }))
}

async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .auth
        .sign_up(&req.email, &req.password)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(UserResponse { user }))
}

/// Never fails; sessions belong to the signed-in user and are closed too
async fn sign_out(State(state): State<AppState>) -> Json<SignOutResponse> {
    let outcome = state.auth.sign_out().await;
    let closed = state.sessions.close_all().await;
    tracing::info!(
        closed_sessions = closed,
        warning = outcome.warning.as_deref().unwrap_or(""),
        "Signed out"
    );
    Json(SignOutResponse {
        signed_out: true,
        warning: outcome.warning,
    })
}

fn require_user(state: &AppState) -> Result<AuthUser, AppError> {
    state
        .auth
        .current_user()
        .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
}

/// Sessions of other users read as unknown
async fn session_for(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    let user = require_user(state)?;
    state
        .sessions
        .get(id, &user.id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(State(state): State<AppState>) -> Result<Response, AppError> {
    let user = require_user(&state)?;
    let handle = state.sessions.create(&user.id).await;
    let snapshot = handle.snapshot().await.map_err(AppError::from)?;
    let live_sessions = state.sessions.len().await;
    tracing::info!(
        session_id = %handle.session_id(),
        user = %user.email,
        live_sessions,
        "Session started"
    );
    Ok((StatusCode::CREATED, Json(snapshot)).into_response())
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let handle = session_for(&state, &id).await?;
    let snapshot = handle.snapshot().await.map_err(AppError::from)?;
    Ok(Json(snapshot).into_response())
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = require_user(&state)?;
    if state.sessions.close(&id, &user.id).await {
        tracing::info!(session_id = %id, "Session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session not found: {id}")))
    }
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = session_for(&state, &id).await?;

    // Subscribe before the snapshot so nothing falls in between
    let broadcast_rx = handle.subscribe();
    let snapshot = handle.snapshot().await.map_err(AppError::from)?;

    Ok(sse_stream(SessionUpdate::Init { snapshot }, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn submit_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let handle = session_for(&state, &id).await?;
    match handle.submit(req.text).await {
        Ok(applied) => Ok(Json(SubmitResponse::accepted(applied))),
        Err(SessionError::Rejected(reason)) => Ok(Json(SubmitResponse::rejected(&reason))),
        Err(e) => Err(e.into()),
    }
}

async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let handle = session_for(&state, &id).await?;
    action_response(handle.clear().await)
}

async fn edit_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let handle = session_for(&state, &id).await?;
    action_response(handle.edit_draft(req.text).await)
}

async fn append_voice_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoiceTranscriptRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let handle = session_for(&state, &id).await?;
    action_response(handle.append_voice_transcript(req.transcript).await)
}

async fn history_up(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let handle = session_for(&state, &id).await?;
    action_response(handle.history_up().await)
}

async fn history_down(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let handle = session_for(&state, &id).await?;
    action_response(handle.history_down().await)
}

fn action_response(result: Result<Applied, SessionError>) -> Result<Json<ActionResponse>, AppError> {
    match result {
        Ok(applied) => Ok(Json(ActionResponse::accepted(applied))),
        Err(SessionError::Rejected(reason)) => Ok(Json(ActionResponse::rejected(&reason))),
        Err(e) => Err(e.into()),
    }
}

// ============================================================
// Export
// ============================================================

async fn export_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let handle = session_for(&state, &id).await?;
    let snapshot = handle.snapshot().await.map_err(AppError::from)?;

    let exported_at = Utc::now();
    let body = match query.format {
        ExportFormat::Text => render_text(&snapshot.messages, exported_at, &Local),
        ExportFormat::Json => render_json(&snapshot.messages, exported_at)
            .map_err(|e| AppError::Internal(e.to_string()))?,
    };

    let file_name = query
        .file_name
        .as_deref()
        .map(sanitize_file_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            default_file_name(query.format, exported_at.with_timezone(&Local).date_naive())
        });

    tracing::info!(
        session_id = %id,
        format = query.format.extension(),
        messages = snapshot.messages.len(),
        "Conversation exported"
    );

    let headers = [
        (header::CONTENT_TYPE, query.format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];
    Ok((headers, body).into_response())
}

/// Strip characters that would break the header or name a path
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | '"') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

// ============================================================
// Host info
// ============================================================

async fn get_capabilities(State(state): State<AppState>) -> Json<CapabilityReport> {
    Json(CapabilityReport::from_capabilities(
        state.capabilities.as_ref(),
    ))
}

async fn get_version() -> &'static str {
    concat!("chatbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Rejected(reason) => AppError::BadRequest(reason.to_string()),
            SessionError::Closed => AppError::Internal(SessionError::Closed.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
