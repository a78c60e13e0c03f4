pub mod audio;
pub mod auth;
pub mod config;
pub mod detect;
pub mod error;
pub mod finalize;
pub mod http;
pub mod llm;
pub mod normalize;
pub mod session;
pub mod storage;
pub mod store;
pub mod stt;
pub mod vocab;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use http::{create_router, AppState};
pub use session::{LiveSession, SessionManager, SessionState};
