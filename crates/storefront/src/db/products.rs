//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use shopfront_core::{CategoryId, Price, ProductId};

use super::{RepositoryError, Violation, map_write_error};
use crate::models::{NewProduct, Product, ProductChanges};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    image_url: Option<String>,
    category_id: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price,
            image_url: row.image_url,
            category_id: CategoryId::new(row.category_id),
            created_at: row.created_at,
        })
    }
}

/// Message for a write that hit a constraint. A unique violation is the
/// product name; a foreign-key violation is the category.
fn conflict_message(
    violation: Violation,
    name: Option<&str>,
    category_id: Option<CategoryId>,
) -> String {
    match (violation, name, category_id) {
        (Violation::Unique, Some(name), _) => format!("Product {name} already exists"),
        (Violation::Unique, None, _) => "A product with this name already exists".to_owned(),
        (Violation::ForeignKey, _, Some(id)) => format!("Category {id} does not exist"),
        (Violation::ForeignKey, _, None) => "Category does not exist".to_owned(),
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, image_url, category_id, created_at
            FROM product
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, image_url, category_id, created_at
            FROM product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Whether a product other than `exclude` already uses `name`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name_taken(
        &self,
        name: &str,
        exclude: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM product
                WHERE name = $1 AND ($2::INTEGER IS NULL OR id <> $2)
            )
            ",
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken or the
    /// category does not exist.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO product (name, price, image_url, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, image_url, category_id, created_at
            ",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.image_url.as_deref())
        .bind(product.category_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, |violation| {
                conflict_message(violation, Some(&product.name), Some(product.category_id))
            })
        })?;

        Product::try_from(row)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken or the
    /// new category does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let (set_image, image_url) = match &changes.image_url {
            Some(url) => (true, url.as_deref()),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE product
            SET name = COALESCE($2, name),
                price = COALESCE($3, price),
                image_url = CASE WHEN $4 THEN $5 ELSE image_url END,
                category_id = COALESCE($6, category_id)
            WHERE id = $1
            RETURNING id, name, price, image_url, category_id, created_at
            ",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.price)
        .bind(set_image)
        .bind(image_url)
        .bind(changes.category_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, |violation| {
                conflict_message(violation, changes.name.as_deref(), changes.category_id)
            })
        })?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
