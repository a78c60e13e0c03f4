use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::session::SessionManager;
use crate::store::MetadataStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Registry of live sessions and their collaborators
    pub manager: Arc<SessionManager>,

    /// Durable notes, keyword packs, and reference documents
    pub store: Arc<dyn MetadataStore>,

    /// Bearer-token verification for the REST surface
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(
        manager: Arc<SessionManager>,
        store: Arc<dyn MetadataStore>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            manager,
            store,
            verifier,
        }
    }
}
