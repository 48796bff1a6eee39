//! Shared application state.

use std::sync::Arc;

use database::Database;
use model_core::ChatModel;
use upload_signer::UploadSigner;

use crate::auth::SessionVerifier;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<SessionVerifier>,
    /// Absent when the image CDN is not configured.
    pub uploads: Option<UploadSigner>,
    /// Absent when no model is configured.
    pub model: Option<Arc<dyn ChatModel>>,
}

impl AppState {
    pub fn new(db: Database, sessions: SessionVerifier) -> Self {
        Self {
            db,
            sessions: Arc::new(sessions),
            uploads: None,
            model: None,
        }
    }

    pub fn with_uploads(mut self, signer: UploadSigner) -> Self {
        self.uploads = Some(signer);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }
}
