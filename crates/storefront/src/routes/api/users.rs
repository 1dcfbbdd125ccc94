//! User API endpoints.
//!
//! Anyone may list, read and create users. Updating or deleting a user
//! requires that user's own bearer token.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use shopfront_core::UserId;

use super::{ApiJson, ApiPath, string_value};
use crate::db::UserRepository;
use crate::error::ApiError;
use crate::middleware::BearerAuth;
use crate::models::User;
use crate::services::access::ensure_self;
use crate::state::AppState;

/// Payload for `POST /api/users`. Every field is required and must be a
/// string.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
}

/// Payload for `PUT /api/users/{id}`. Absent fields are left unchanged;
/// unknown fields such as `id` or `is_admin` are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// List every user.
///
/// GET /api/users
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// Get one user.
///
/// GET /api/users/{id}
///
/// # Errors
///
/// Returns 404 if no such user exists.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>, ApiError> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Register a new user.
///
/// POST /api/users
///
/// # Errors
///
/// Returns 400 for a missing or invalid field and when the username or
/// email is already taken.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let username = body
        .username
        .ok_or_else(|| ApiError::missing_field("username"))?;
    let email = body.email.ok_or_else(|| ApiError::missing_field("email"))?;
    let password = body
        .password
        .ok_or_else(|| ApiError::missing_field("password"))?;

    let username = string_value(username, "username")?;
    let email = string_value(email, "email")?;
    let password = string_value(password, "password")?;

    let user = state.auth().register(&username, &email, &password).await?;
    tracing::info!(user_id = %user.id, "User registered via API");
    Ok(Json(user))
}

/// Update the caller's own account.
///
/// PUT /api/users/{id}
///
/// # Errors
///
/// Returns 401 without a valid token, 403 when `id` is not the caller, and
/// 400 for invalid or already-taken values.
#[instrument(skip_all, fields(user_id = %user.id, target_id = %id))]
pub async fn update(
    BearerAuth(user): BearerAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
    body: Result<ApiJson<UpdateUserRequest>, ApiError>,
) -> Result<Json<User>, ApiError> {
    ensure_self(&user, id, "update")?;
    let ApiJson(body) = body?;

    let updated = state
        .auth()
        .update_profile(
            &user,
            body.username.as_deref(),
            body.email.as_deref(),
            body.password.as_deref(),
        )
        .await?;
    Ok(Json(updated))
}

/// Delete the caller's own account.
///
/// DELETE /api/users/{id}
///
/// # Errors
///
/// Returns 401 without a valid token and 403 when `id` is not the caller.
#[instrument(skip_all, fields(user_id = %user.id, target_id = %id))]
pub async fn delete(
    BearerAuth(user): BearerAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<StatusCode, ApiError> {
    ensure_self(&user, id, "delete")?;
    UserRepository::new(state.pool()).delete(id).await?;
    tracing::info!("User deleted via API");
    Ok(StatusCode::NO_CONTENT)
}
