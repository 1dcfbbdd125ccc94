//! API token endpoints.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::middleware::{BasicAuth, BearerAuth};
use crate::state::AppState;

/// Response carrying a bearer token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Exchange HTTP Basic credentials for a bearer token.
///
/// POST /api/token
///
/// Calling again before the token is about to expire returns the same token.
///
/// # Errors
///
/// Returns 401 for missing or wrong credentials.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn issue(
    BasicAuth(user): BasicAuth,
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.auth().issue_token(&user, Utc::now()).await?;
    Ok(Json(TokenResponse { token }))
}

/// Revoke the caller's token.
///
/// DELETE /api/token
///
/// # Errors
///
/// Returns 401 if the bearer token is missing, unknown or expired.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn revoke(
    BearerAuth(user): BearerAuth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.auth().revoke_token(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
