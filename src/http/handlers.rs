use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use tracing::info;

use super::state::AppState;
use crate::error::ServiceError;
use crate::finalize::FinalizationResult;
use crate::session::CreateSession;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub message: &'static str,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResponse {
    pub recording_url: String,
    pub duration_seconds: u64,
}

// ============================================================================
// Authentication
// ============================================================================

/// The authenticated caller, extracted from the `Authorization` header.
pub struct AuthedUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;
        let user_id = state
            .verifier
            .verify(token)
            .ok_or_else(|| ServiceError::Unauthorized("invalid token".to_string()))?;
        Ok(AuthedUser(user_id))
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create the durable note backing a new recording session
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(req): Json<CreateSession>,
) -> Result<impl IntoResponse, ServiceError> {
    let session_id = state.manager.create_session(&user.0, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id }),
    ))
}

/// POST /sessions/:session_id/stop
/// Stop a live session and return the finalization outcome
pub async fn stop_session(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<Json<FinalizationResult>, ServiceError> {
    info!("[{}] Stop requested by user {}", session_id, user.0);
    let result = state.manager.stop(&session_id, &user.0).await?;
    Ok(Json(result))
}

/// POST /sessions/:session_id/cancel
/// Discard a session and its note without finalizing
pub async fn cancel_session(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    info!("[{}] Cancel requested by user {}", session_id, user.0);
    state.manager.cancel(&session_id, &user.0).await?;
    Ok(Json(CancelResponse {
        message: "Recording cancelled and deleted successfully",
        session_id,
    }))
}

/// GET /recordings/:note_id
/// Fetch the playback URL for a finalized recording
pub async fn get_recording(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(note_id): Path<String>,
) -> Result<Json<RecordingResponse>, ServiceError> {
    let note = state
        .store
        .get_note(&note_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("note {note_id}")))?;

    // Private notes are indistinguishable from missing ones to everyone
    // but their owner.
    if note.author_id != user.0 && !note.is_public {
        return Err(ServiceError::NotFound(format!("note {note_id}")));
    }

    let recording_url = note
        .recording_url
        .ok_or_else(|| ServiceError::NotFound("recording not available".to_string()))?;

    Ok(Json(RecordingResponse {
        recording_url,
        duration_seconds: note.duration_seconds,
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
