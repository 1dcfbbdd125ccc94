//! Business logic services for the shop.
//!
//! # Services
//!
//! - `auth` - Registration, password login and API tokens
//! - `access` - Ownership and admin checks

pub mod access;
pub mod auth;
