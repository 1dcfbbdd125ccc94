//! Unified error handling with Sentry integration.
//!
//! Two response error types share the same rules for what gets reported:
//!
//! - [`AppError`] for the HTML views (plain or rendered error pages)
//! - [`ApiError`] for the JSON API (`{"error": "..."}` bodies)
//!
//! Server errors are captured to Sentry and logged before responding; their
//! details are never sent to the client.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::filters;
use crate::page::PageContext;
use crate::services::access::Forbidden;
use crate::services::auth::AuthError;

/// Rendered 404 page.
///
/// Rendered without the visitor's session, so the navigation shows the
/// logged-out links.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub page: PageContext,
}

/// Capture a server error to Sentry and log it with the event ID.
fn report(error: &(dyn std::error::Error + 'static)) {
    let event_id = sentry::capture_error(error);
    tracing::error!(
        error = %error,
        sentry_event_id = %event_id,
        "Request error"
    );
}

// =============================================================================
// HTML errors
// =============================================================================

/// Application-level error type for the HTML views.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

/// A path segment that does not parse (`/products/abc`) names no page.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => Self::NotFound,
            other => Self::Internal(other.body_text()),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => auth_status(err),
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            report(&self);
            return (status, "Internal server error").into_response();
        }

        match self {
            Self::NotFound | Self::Database(RepositoryError::NotFound) => {
                let page = PageContext::default();
                (StatusCode::NOT_FOUND, NotFoundTemplate { page }).into_response()
            }
            Self::Auth(err) => (status, err.to_string()).into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// JSON API errors
// =============================================================================

/// Authentication scheme named in the `WWW-Authenticate` header of a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Bearer,
}

impl AuthScheme {
    const fn challenge(self) -> &'static str {
        match self {
            Self::Basic => "Basic realm=\"shopfront\"",
            Self::Bearer => "Bearer realm=\"shopfront\"",
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error type for the JSON API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or invalid request payload.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized")]
    Unauthorized(AuthScheme),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The error for a required payload field that is absent or null.
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::BadRequest(format!("You are missing the {field} field"))
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(message) => Self::BadRequest(message),
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidUsername(_)
            | AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_)
            | AuthError::UserAlreadyExists { .. } => Self::BadRequest(err.to_string()),
            AuthError::InvalidCredentials => Self::Unauthorized(AuthScheme::Basic),
            AuthError::InvalidToken => Self::Unauthorized(AuthScheme::Bearer),
            AuthError::Repository(repo) => Self::from(repo),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}

impl From<Forbidden> for ApiError {
    fn from(err: Forbidden) -> Self {
        Self::Forbidden(err.0)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => Self::NotFound,
            other => Self::Internal(other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            report(&self);
        }

        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let mut response = (status, Json(ErrorBody { error: message })).into_response();
        if let Self::Unauthorized(scheme) = self {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(scheme.challenge()),
            );
        }
        response
    }
}

const fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidUsername(_)
        | AuthError::InvalidEmail(_)
        | AuthError::WeakPassword(_)
        | AuthError::UserAlreadyExists { .. } => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AuthError::Repository(_) | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
