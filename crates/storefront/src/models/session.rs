//! Session-related types.
//!
//! Only the user's ID is kept in the session; the account is reloaded on
//! every request so admin changes and deletions take effect immediately.

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the logged-in user's ID.
    pub const USER_ID: &str = "user_id";

    /// Key for pending flash messages.
    pub const FLASHES: &str = "_flashes";
}
