use axum::{Extension, Json};
use serde::Serialize;

use crate::auth::AuthUser;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckResponse {
    pub status: &'static str,
    pub user_id: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Confirms the session and echoes the caller's user id.
pub async fn auth_check(Extension(user): Extension<AuthUser>) -> Json<AuthCheckResponse> {
    Json(AuthCheckResponse {
        status: "ok",
        user_id: user.user_id,
    })
}
