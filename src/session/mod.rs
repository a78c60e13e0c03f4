//! Live session management
//!
//! This module provides the session layer that manages:
//! - The registry of live sessions keyed by note id
//! - The client channel protocol (events out, audio and controls in)
//! - Streaming recognition, vocabulary substitution, and detection
//! - Pause/resume across channel drops and the stop/cancel paths

mod events;
mod manager;
mod session;

pub use events::{ClientMessage, ControlAction, ServerMessage, ToggleState};
pub use manager::{AttachedSession, CreateSession, SessionManager};
pub use session::{LiveSession, SessionState};

/// Detection features a client can toggle per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Keywords,
    Hints,
}
