//! Category domain type.

use serde::Serialize;

use shopfront_core::CategoryId;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}
