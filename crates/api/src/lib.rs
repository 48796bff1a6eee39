//! HTTP API for the chat application.
//!
//! Routes are split between a public surface (health, upload signing) and a
//! session-protected surface (chats, the per-user chat index and streamed
//! answers). See [`routes::create_router`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, SessionVerifier};
pub use config::{Config, ModelProvider};
pub use error::ApiError;
pub use state::AppState;
