//! HTTP API server for session control and the live channel
//!
//! This module provides the service's outward surface:
//! - POST /sessions - Create a new recording session
//! - GET /sessions/:id/stream - WebSocket channel for a live session
//! - POST /sessions/:id/stop - Stop and finalize a session
//! - POST /sessions/:id/cancel - Discard a session and its note
//! - GET /recordings/:note_id - Playback URL for a finalized recording
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use handlers::{bearer_token, AuthedUser};
pub use routes::create_router;
pub use state::AppState;
