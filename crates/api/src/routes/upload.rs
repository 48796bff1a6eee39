//! Direct-upload authentication for the image CDN.

use axum::extract::State;
use axum::Json;
use upload_signer::AuthenticationParameters;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Issue a fresh set of signed upload parameters.
///
/// Public: the browser calls this before the user has a chat.
pub async fn upload_params(State(state): State<AppState>) -> Result<Json<AuthenticationParameters>> {
    let signer = state
        .uploads
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("image uploads are not configured".to_string()))?;

    let params = signer
        .authentication_parameters()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(params))
}
