//! Catalog commands: categories and demo data.
//!
//! ```bash
//! shopfront-cli category create -n Mugs
//! shopfront-cli category delete -n Mugs
//! shopfront-cli seed
//! ```

use rust_decimal::Decimal;
use sqlx::PgPool;

use shopfront::db::{CategoryRepository, ProductRepository};
use shopfront::models::NewProduct;
use shopfront::models::product::normalize_name;
use shopfront_core::{CategoryId, Price};

use super::{CliError, connect};

/// Demo catalog: `(category, [(product, price in cents)])`.
const DEMO_CATALOG: &[(&str, &[(&str, i64)])] = &[
    ("Mugs", &[("Enamel Camp Mug", 1800), ("Stoneware Mug", 2400)]),
    ("Shirts", &[("Logo Tee", 2500), ("Long Sleeve Tee", 3200)]),
    ("Stickers", &[("Sticker Pack", 600)]),
];

/// Create a category.
///
/// # Errors
///
/// Returns `CliError::InvalidInput` for a blank or overlong name and
/// `CliError::Repository` if the name already exists.
pub async fn create_category(name: &str) -> Result<(), CliError> {
    let name = normalize_name(name).map_err(CliError::InvalidInput)?;
    let pool = connect().await?;

    let category = CategoryRepository::new(&pool).create(&name).await?;
    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok(())
}

/// Delete a category by name. Categories that still have products are
/// kept.
///
/// # Errors
///
/// Returns `CliError::UnknownCategory` if no category has this name and
/// `CliError::Repository` with a conflict if products still use it.
pub async fn delete_category(name: &str) -> Result<(), CliError> {
    let pool = connect().await?;
    let categories = CategoryRepository::new(&pool);

    let category = categories
        .get_by_name(name.trim())
        .await?
        .ok_or_else(|| CliError::UnknownCategory(name.trim().to_string()))?;
    categories.delete(category.id).await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category deleted");
    Ok(())
}

/// Insert the demo catalog, skipping categories and products that already
/// exist by name.
///
/// # Errors
///
/// Returns `CliError` if a database operation fails.
pub async fn seed() -> Result<(), CliError> {
    let pool = connect().await?;

    let mut created = 0_usize;
    for &(category_name, products) in DEMO_CATALOG {
        let category_id = ensure_category(&pool, category_name).await?;
        for &(product_name, cents) in products {
            if seed_product(&pool, category_id, product_name, cents).await? {
                created += 1;
            }
        }
    }

    tracing::info!(created, "Seeding complete");
    Ok(())
}

async fn ensure_category(pool: &PgPool, name: &str) -> Result<CategoryId, CliError> {
    let categories = CategoryRepository::new(pool);
    if let Some(existing) = categories.get_by_name(name).await? {
        return Ok(existing.id);
    }
    let category = categories.create(name).await?;
    tracing::info!(category_id = %category.id, name, "Seeded category");
    Ok(category.id)
}

/// Insert one product unless the name is taken. Returns whether it was
/// inserted.
async fn seed_product(
    pool: &PgPool,
    category_id: CategoryId,
    name: &str,
    cents: i64,
) -> Result<bool, CliError> {
    let products = ProductRepository::new(pool);
    if products.name_taken(name, None).await? {
        tracing::debug!(name, "Product exists, skipping");
        return Ok(false);
    }

    let price =
        Price::new(Decimal::new(cents, 2)).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let product = products
        .create(&NewProduct {
            name: name.to_string(),
            price,
            image_url: None,
            category_id,
        })
        .await?;

    tracing::info!(product_id = %product.id, name, "Seeded product");
    Ok(true)
}
