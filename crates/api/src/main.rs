//! Chat backend API server.
//!
//! Serves chat documents, the per-user chat index, image upload signing and
//! streamed model answers to the browser client.

use std::sync::Arc;

use api::config::{Config, ModelProvider};
use api::routes;
use api::{AppState, SessionVerifier};
use database::Database;
use gemini_model::GeminiModel;
use mock_model::EchoModel;
use model_core::{ChatModel, ModelError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use upload_signer::UploadSigner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, model = ?config.model_provider, "Starting chat API");

    let db = Database::connect_with_pool_size(&config.database_url, config.database_pool_size).await?;
    db.migrate().await?;

    let sessions = SessionVerifier::from_config(&config.auth)?;
    let mut state = AppState::new(db, sessions);

    match UploadSigner::from_env() {
        Ok(signer) => state = state.with_uploads(signer),
        Err(e) => warn!(error = %e, "Image upload signing disabled"),
    }

    match build_model(config.model_provider)? {
        Some(model) => {
            info!(model = model.name(), "Chat model ready");
            state = state.with_model(model);
        }
        None => warn!("No chat model configured; answers are unavailable"),
    }

    let app = routes::create_router(state, &config.allowed_origins);

    info!(addr = %config.addr, "Chat API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_model(provider: ModelProvider) -> Result<Option<Arc<dyn ChatModel>>, ModelError> {
    let model: Arc<dyn ChatModel> = match provider {
        ModelProvider::Gemini => Arc::new(GeminiModel::from_env()?),
        ModelProvider::Mock => Arc::new(EchoModel::with_prefix("[mock] ")),
        ModelProvider::None => return Ok(None),
    };
    Ok(Some(model))
}
