//! User management commands.
//!
//! ```bash
//! shopfront-cli user create -u alice -e alice@example.com -p 'long password' --admin
//! shopfront-cli user promote -u bob
//! shopfront-cli user demote -u alice
//! ```

use shopfront::db::UserRepository;
use shopfront::services::auth::AuthService;
use shopfront_core::Username;

use super::{CliError, connect};

/// Token lifetime passed to the auth service; the CLI never issues tokens.
const UNUSED_TOKEN_TTL_SECONDS: i64 = 3600;

/// Create a user account.
///
/// # Errors
///
/// Returns `CliError::Auth` for invalid input or a taken username/email.
pub async fn create(
    username: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> Result<(), CliError> {
    let pool = connect().await?;
    let user = AuthService::new(&pool, UNUSED_TOKEN_TTL_SECONDS)
        .create_account(username, email, password, is_admin)
        .await?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        is_admin = user.is_admin,
        "User created"
    );
    Ok(())
}

/// Grant or revoke administrator rights.
///
/// Demoting the last remaining administrator is refused.
///
/// # Errors
///
/// Returns `CliError::UnknownUser` if no such user exists and
/// `CliError::LastAdmin` when demoting the only admin.
pub async fn set_admin(username: &str, is_admin: bool) -> Result<(), CliError> {
    let username = Username::parse(username).map_err(|e| CliError::InvalidInput(e.to_string()))?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_username(&username)
        .await?
        .ok_or_else(|| CliError::UnknownUser(username.to_string()))?;

    if user.is_admin == is_admin {
        tracing::info!(username = %username, is_admin, "Nothing to change");
        return Ok(());
    }
    if !is_admin && users.count_admins().await? <= 1 {
        return Err(CliError::LastAdmin(username.to_string()));
    }

    let user = users.set_admin(&username, is_admin).await?;
    tracing::info!(user_id = %user.id, username = %user.username, is_admin, "Admin flag updated");
    Ok(())
}
