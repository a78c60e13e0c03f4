//! Service-wide error taxonomy.
//!
//! Every fallible operation on the session manager and its collaborators
//! returns [`Result<T>`] with [`ServiceError`]. The variants map directly
//! onto HTTP responses for the control plane; during live streaming most
//! upstream failures are absorbed instead of propagated (see the session
//! module).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by session operations and collaborator calls.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or invalid identity token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller does not own the resource.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// Session, note, pack, or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required field is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A speech, LLM, or storage provider call failed.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Encoding failure or unexpected internal state.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Shorthand for an upstream failure carrying the provider error text.
    pub fn upstream(context: &str, err: impl std::fmt::Display) -> Self {
        ServiceError::Upstream(format!("{context}: {err}"))
    }

    fn status(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = ServiceError::Forbidden("not the session owner".into());
        assert_eq!(err.to_string(), "access denied: not the session owner");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServiceError::Unauthorized("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::NotFound("session".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Validation("title".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Upstream("stt".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn upstream_helper_formats_context() {
        let err = ServiceError::upstream("batch transcription", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "upstream failure: batch transcription: HTTP 503"
        );
    }
}
