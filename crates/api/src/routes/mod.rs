//! Router setup with all API routes and middleware.

mod answer;
mod chats;
mod health;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::state::AppState;

/// Request bodies may carry a base64-encoded image.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Create the router with all routes and middleware.
///
/// `allowed_origins` lists the browser origins allowed to make credentialed
/// cross-origin calls.
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/upload", get(upload::upload_params));

    let protected_routes = Router::new()
        .route("/api/test", get(health::auth_check))
        .route("/api/chats", post(chats::create_chat))
        .route("/api/userchats", get(chats::list_user_chats))
        .route("/api/chats/:id", get(chats::get_chat).put(chats::update_chat))
        .route("/api/chats/:id/answer", post(answer::stream_answer))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|origin| {
            if origin.as_str() == "*" {
                tracing::warn!("Ignoring wildcard CORS origin; origins must be listed explicitly");
                return false;
            }
            true
        })
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("No CORS origins configured; browser clients will be rejected");
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}
