//! Authentication extractors.
//!
//! HTML views authenticate with the session cookie:
//!
//! - [`RequireLogin`] redirects anonymous visitors to `/login`
//! - [`RequireAdmin`] additionally sends non-admins back to `/` with a warning
//!
//! The JSON API authenticates per request from the `Authorization` header:
//!
//! - [`BasicAuth`] checks a username and password (token issue only)
//! - [`BearerAuth`] resolves an API token

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use tower_sessions::Session;

use shopfront_core::UserId;

use crate::db::UserRepository;
use crate::error::{ApiError, AppError, AuthScheme};
use crate::flash::{self, FlashLevel};
use crate::models::{User, session_keys};
use crate::state::AppState;

/// Flash shown to logged-in users who open an admin-only page.
pub const NOT_ALLOWED_MESSAGE: &str = "Excuse me, you are not allowed here.";

// =============================================================================
// Session (HTML)
// =============================================================================

/// Load the logged-in user for a session.
///
/// A session pointing at a deleted account is logged out.
///
/// # Errors
///
/// Returns `AppError` if the session or the database cannot be read.
pub async fn load_session_user(
    session: &Session,
    state: &AppState,
) -> Result<Option<User>, AppError> {
    let Some(user_id) = session.get::<UserId>(session_keys::USER_ID).await? else {
        return Ok(None);
    };

    let user = UserRepository::new(state.pool()).get_by_id(user_id).await?;
    if user.is_none() {
        tracing::info!(user_id = %user_id, "Session refers to a deleted user, logging out");
        session.remove::<UserId>(session_keys::USER_ID).await?;
    }
    Ok(user)
}

/// Mark the session as logged in as `user`.
///
/// The session ID is rotated to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn login_session(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::USER_ID, user.id).await
}

/// Log the session out, keeping it alive for the flash that follows.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn logout_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserId>(session_keys::USER_ID).await?;
    session.cycle_id().await
}

/// Rejection for the session extractors.
pub enum AuthRejection {
    /// Not logged in.
    RedirectToLogin,
    /// Logged in, but not an admin.
    NotAllowed,
    /// Session or database failure.
    Error(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::NotAllowed => Redirect::to("/").into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireLogin(user): RequireLogin) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireLogin(pub User);

impl FromRequestParts<AppState> for RequireLogin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::RedirectToLogin)?;

        load_session_user(&session, state)
            .await
            .map_err(AuthRejection::Error)?
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that requires a logged-in administrator.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireLogin(user) = RequireLogin::from_request_parts(parts, state).await?;
        if user.is_admin {
            return Ok(Self(user));
        }

        tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");
        if let Some(session) = parts.extensions.get::<Session>() {
            flash::push(session, FlashLevel::Warning, NOT_ALLOWED_MESSAGE).await;
        }
        Err(AuthRejection::NotAllowed)
    }
}

// =============================================================================
// Authorization header (JSON API)
// =============================================================================

/// Extractor for HTTP Basic credentials, verified against the user store.
pub struct BasicAuth(pub User);

impl FromRequestParts<AppState> for BasicAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (username, password) = basic_credentials(&parts.headers)
            .ok_or(ApiError::Unauthorized(AuthScheme::Basic))?;

        let user = state.auth().login(&username, &password).await.map_err(|e| {
            tracing::warn!(username = %username, "API login rejected");
            ApiError::from(e)
        })?;

        Ok(Self(user))
    }
}

/// Extractor for a bearer API token.
pub struct BearerAuth(pub User);

impl FromRequestParts<AppState> for BearerAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(&parts.headers).ok_or(ApiError::Unauthorized(AuthScheme::Bearer))?;

        let user = state.auth().authenticate_token(token, Utc::now()).await?;
        Ok(Self(user))
    }
}

/// Split an `Authorization` header into its scheme and credentials, matching
/// the scheme case-insensitively.
fn credentials<'h>(headers: &'h HeaderMap, scheme: &str) -> Option<&'h str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (given, rest) = value.split_once(' ')?;
    let rest = rest.trim();
    (given.eq_ignore_ascii_case(scheme) && !rest.is_empty()).then_some(rest)
}

/// Decode `Authorization: Basic base64(username:password)`.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = credentials(headers, "Basic")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_owned(), password.to_owned()))
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    credentials(headers, "Bearer")
}
