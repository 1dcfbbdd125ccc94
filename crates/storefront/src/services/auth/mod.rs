//! Authentication service.
//!
//! Provides password registration and login for the HTML views, and the
//! bearer tokens used by the JSON API.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;

use shopfront_core::{Email, Username};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{NewUser, User, UserChanges};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A token with less than this much lifetime left is replaced rather than
/// handed out again.
const TOKEN_REUSE_MARGIN_SECONDS: i64 = 60;

/// Number of random bytes in an API token.
const TOKEN_BYTES: usize = 32;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    token_ttl: TimeDelta,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// `token_ttl_seconds` is the lifetime of newly issued API tokens.
    #[must_use]
    pub fn new(pool: &'a PgPool, token_ttl_seconds: i64) -> Self {
        Self {
            users: UserRepository::new(pool),
            token_ttl: TimeDelta::seconds(token_ttl_seconds),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new (non-admin) user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` / `AuthError::InvalidEmail` for
    /// malformed input, `AuthError::WeakPassword` if the password is too
    /// short, and `AuthError::UserAlreadyExists` if the username or email is
    /// already registered.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.create_account(username, email, password, false).await
    }

    /// Create an account with an explicit admin flag.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self
            .users
            .username_or_email_taken(Some(&username), Some(&email), None)
            .await?
        {
            return Err(AuthError::UserAlreadyExists { username, email });
        }

        let new_user = NewUser {
            username,
            email,
            password_hash: hash_password(password)?,
            is_admin,
        };

        // The pre-check can race with a concurrent insert; the unique
        // constraints catch that case.
        self.users.create(&new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists {
                username: new_user.username.clone(),
                email: new_user.email.clone(),
            },
            other => AuthError::Repository(other),
        })
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown or
    /// the password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a user's username, email and/or password.
    ///
    /// Absent values are left unchanged. A username or email that belongs to
    /// another account is rejected with `UserAlreadyExists`, naming the
    /// values the account would have had after the update.
    ///
    /// # Errors
    ///
    /// Returns validation errors as for [`AuthService::register`] and
    /// `AuthError::Repository` with `NotFound` if the user no longer exists.
    pub async fn update_profile(
        &self,
        user: &User,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<User, AuthError> {
        let username = username.map(Username::parse).transpose()?;
        let email = email.map(Email::parse).transpose()?;
        let password_hash = match password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            username,
            email,
            password_hash,
        };
        if changes.is_empty() {
            return Ok(user.clone());
        }

        let already_exists = || AuthError::UserAlreadyExists {
            username: changes.username.clone().unwrap_or_else(|| user.username.clone()),
            email: changes.email.clone().unwrap_or_else(|| user.email.clone()),
        };

        if self
            .users
            .username_or_email_taken(changes.username.as_ref(), changes.email.as_ref(), Some(user.id))
            .await?
        {
            return Err(already_exists());
        }

        let updated = self.users.update(user.id, &changes).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => already_exists(),
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "User profile updated");
        Ok(updated)
    }

    // =========================================================================
    // API Tokens
    // =========================================================================

    /// Return a bearer token for `user`.
    ///
    /// The current token is reused while it has more than a minute left;
    /// otherwise a fresh one is generated and stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn issue_token(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        if let Some((token, expires_at)) = self.users.get_token(user.id).await?
            && token_still_fresh(expires_at, now)
        {
            return Ok(token);
        }

        let token = generate_token();
        self.users
            .set_token(user.id, &token, now + self.token_ttl)
            .await?;

        tracing::info!(user_id = %user.id, "Issued API token");
        Ok(token)
    }

    /// Expire the user's token immediately.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn revoke_token(&self, user: &User) -> Result<(), AuthError> {
        self.users.revoke_token(user.id).await?;
        tracing::info!(user_id = %user.id, "Revoked API token");
        Ok(())
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if no user holds an unexpired token
    /// with this value.
    pub async fn authenticate_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        self.users
            .get_by_token(token, now)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is shorter than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a random URL-safe API token.
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn token_still_fresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at > now + TimeDelta::seconds(TOKEN_REUSE_MARGIN_SECONDS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eightchr").is_ok());
    }

    #[test]
    fn test_validate_password_counts_characters() {
        // Four two-byte characters are still only four characters.
        assert!(validate_password("éééé").is_err());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_password_uses_fresh_salt() {
        assert_ne!(
            hash_password("same password").unwrap(),
            hash_password("same password").unwrap()
        );
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_token_still_fresh() {
        let now = Utc::now();
        assert!(token_still_fresh(now + TimeDelta::seconds(61), now));
        assert!(!token_still_fresh(now + TimeDelta::seconds(60), now));
        assert!(!token_still_fresh(now - TimeDelta::seconds(1), now));
    }

    #[test]
    fn test_duplicate_user_message() {
        let err = AuthError::UserAlreadyExists {
            username: Username::parse("alice").unwrap(),
            email: Email::parse("alice@example.com").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "User with username alice or email alice@example.com already exists"
        );
    }
}
