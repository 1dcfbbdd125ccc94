//! Authentication route handlers.
//!
//! Handles registration, login and logout for the HTML views. The session
//! holds only the logged-in user's ID.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Email, Username};

use crate::error::{AppError, Result};
use crate::filters;
use crate::flash::{self, FlashLevel};
use crate::middleware::{login_session, logout_session};
use crate::page::PageContext;
use crate::services::auth::{AuthError, validate_password};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check every field, returning one message per problem.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = Username::parse(&self.username) {
            errors.push(capitalize(&e.to_string()));
        }
        if let Err(e) = Email::parse(&self.email) {
            errors.push(capitalize(&e.to_string()));
        }
        if let Err(e) = validate_password(&self.password) {
            errors.push(e.to_string());
        }
        if self.password != self.confirm_password {
            errors.push("Passwords must match".to_string());
        }

        errors
    }
}

impl LoginForm {
    /// Check that both fields were filled in.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push("Username is required".to_string());
        }
        if self.password.is_empty() {
            errors.push("Password is required".to_string());
        }
        errors
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub errors: Vec<String>,
    pub username: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate {
        page,
        errors: Vec::new(),
        username: String::new(),
    }
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let errors = form.validate();
    if !errors.is_empty() {
        let page = PageContext::load(&session, &state).await?;
        let template = LoginTemplate {
            page,
            errors,
            username: form.username,
        };
        return Ok((StatusCode::BAD_REQUEST, template).into_response());
    }

    match state.auth().login(&form.username, &form.password).await {
        Ok(user) => {
            login_session(&session, &user).await?;
            tracing::info!(user_id = %user.id, "User logged in");
            flash::push(&session, FlashLevel::Success, "You have successfully logged in").await;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login rejected");
            flash::push(
                &session,
                FlashLevel::Danger,
                "That username and/or password is incorrect",
            )
            .await;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        page,
        errors: Vec::new(),
        username: String::new(),
        email: String::new(),
    }
}

/// Handle registration form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let errors = form.validate();
    if !errors.is_empty() {
        let page = PageContext::load(&session, &state).await?;
        let template = RegisterTemplate {
            page,
            errors,
            username: form.username,
            email: form.email,
        };
        return Ok((StatusCode::BAD_REQUEST, template).into_response());
    }

    match state
        .auth()
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User registered");
            flash::push(&session, FlashLevel::Primary, "Thank you for registering!").await;
            Ok(Redirect::to("/").into_response())
        }
        Err(e @ AuthError::UserAlreadyExists { .. }) => {
            flash::push(&session, FlashLevel::Danger, e.to_string()).await;
            Ok(Redirect::to("/register").into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log out and return to the home page.
pub async fn logout(session: Session) -> Result<Redirect> {
    logout_session(&session).await?;
    flash::push(
        &session,
        FlashLevel::Secondary,
        "You have successfully logged out",
    )
    .await;
    Ok(Redirect::to("/"))
}
