//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{CategoryId, Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name (unique).
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Optional image shown on listing and detail pages.
    pub image_url: Option<String>,
    /// Category this product belongs to.
    pub category_id: CategoryId,
    /// When the product was created.
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

/// Data needed to insert a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
}

/// A partial update to a product. `None` leaves the column unchanged.
///
/// `image_url` is doubly optional: `Some(None)` clears the image.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub image_url: Option<Option<String>>,
    pub category_id: Option<CategoryId>,
}

/// Longest product name the database accepts.
pub const MAX_NAME_LENGTH: usize = 100;

/// Longest image URL accepted.
pub const MAX_IMAGE_URL_LENGTH: usize = 2048;

/// Trim and check a product or category name.
///
/// # Errors
///
/// Returns a user-facing message if the name is blank or too long.
pub fn normalize_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name must be at most {MAX_NAME_LENGTH} characters"));
    }
    Ok(name.to_string())
}

/// Trim and check an image URL. Blank means no image.
///
/// # Errors
///
/// Returns a user-facing message unless the URL is an absolute `http(s)`
/// URL without whitespace.
pub fn normalize_image_url(raw: &str) -> Result<Option<String>, String> {
    let url = raw.trim();
    if url.is_empty() {
        return Ok(None);
    }
    if url.len() > MAX_IMAGE_URL_LENGTH {
        return Err(format!(
            "Image URL must be at most {MAX_IMAGE_URL_LENGTH} characters"
        ));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err("Image URL must start with http:// or https://".to_string());
    }
    if url.chars().any(char::is_whitespace) {
        return Err("Image URL cannot contain spaces".to_string());
    }
    Ok(Some(url.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Tea Mug ").unwrap(), "Tea Mug");
        assert_eq!(normalize_name(" ").unwrap_err(), "Name is required");
        assert!(normalize_name(&"n".repeat(101)).is_err());
        assert!(normalize_name(&"n".repeat(100)).is_ok());
    }

    #[test]
    fn test_normalize_image_url() {
        assert_eq!(normalize_image_url("   ").unwrap(), None);
        assert_eq!(
            normalize_image_url(" https://img.test/a.png ").unwrap(),
            Some("https://img.test/a.png".to_string())
        );
        assert!(normalize_image_url("ftp://img.test/a.png").is_err());
        assert!(normalize_image_url("https://img.test/a b.png").is_err());
        assert!(normalize_image_url(&format!("https://{}", "a".repeat(2048))).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let product = Product {
            id: ProductId::new(4),
            name: "Mug".to_string(),
            price: Price::parse("9.5").unwrap(),
            image_url: None,
            category_id: CategoryId::new(2),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 4,
                "name": "Mug",
                "price": "9.50",
                "image_url": null,
                "category_id": 2
            })
        );
    }
}
