//! Core types for Shopfront.
//!
//! Each type validates on construction, so holding one is proof the value
//! passed validation.

pub mod email;
pub mod id;
pub mod price;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use username::{Username, UsernameError};
