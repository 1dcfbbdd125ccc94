//! Authorization rules shared by the HTML views and the JSON API.
//!
//! These are pure checks on an already-authenticated user, so handlers can
//! run them before touching the database.

use thiserror::Error;

use shopfront_core::UserId;

use crate::models::User;

/// The authenticated user may not perform the requested action.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct Forbidden(pub String);

/// Allow the action only on the caller's own account.
///
/// # Errors
///
/// Returns `Forbidden` when `target` is someone else's ID.
pub fn ensure_self(current: &User, target: UserId, action: &str) -> Result<(), Forbidden> {
    if current.id == target {
        Ok(())
    } else {
        Err(Forbidden(format!(
            "You do not have access to {action} this user"
        )))
    }
}

/// Allow the action only for administrators.
///
/// `resource` is the plural noun used in the message, e.g. `"products"`.
///
/// # Errors
///
/// Returns `Forbidden` when the caller is not an admin.
pub fn ensure_admin(current: &User, action: &str, resource: &str) -> Result<(), Forbidden> {
    if current.is_admin {
        Ok(())
    } else {
        Err(Forbidden(format!(
            "You do not have access to {action} {resource}"
        )))
    }
}
