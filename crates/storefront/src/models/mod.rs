//! Domain models for the shop.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Their `Serialize` impls define the JSON API shapes.

pub mod category;
pub mod product;
pub mod session;
pub mod user;

pub use category::Category;
pub use product::{NewProduct, Product, ProductChanges};
pub use session::keys as session_keys;
pub use user::{NewUser, User, UserChanges};
