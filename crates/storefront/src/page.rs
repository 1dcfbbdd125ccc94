//! Per-page context shared by every rendered template.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::middleware::auth::load_session_user;
use crate::models::User;
use crate::state::AppState;

/// Data every page layout needs: who is logged in and which flash messages
/// to show.
///
/// Extracting it consumes the pending flash messages, so take it only in
/// handlers that render a page.
#[derive(Debug, Default)]
pub struct PageContext {
    pub user: Option<User>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Load the context for an explicit session.
    ///
    /// Form handlers use this instead of the extractor so that pending
    /// flashes survive when they answer with a redirect.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the session or the database cannot be read.
    pub async fn load(session: &Session, state: &AppState) -> Result<Self, AppError> {
        let user = load_session_user(session, state).await?;
        let flashes = flash::take(session).await;
        Ok(Self { user, flashes })
    }

    /// Whether the visitor is logged in as an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>().cloned() {
            Some(session) => Self::load(&session, state).await,
            None => Ok(Self::default()),
        }
    }
}
