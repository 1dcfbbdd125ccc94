//! Product API endpoints.
//!
//! Reads are public. Writes need an administrator's bearer token; the admin
//! check runs before the payload is looked at.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use shopfront_core::{CategoryId, Price, PriceError, ProductId};

use super::{ApiJson, ApiPath, nullable, string_value};
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::ApiError;
use crate::middleware::BearerAuth;
use crate::models::product::{normalize_image_url, normalize_name};
use crate::models::{NewProduct, Product, ProductChanges};
use crate::services::access::ensure_admin;
use crate::state::AppState;

/// Payload for `POST /api/products`. `image_url` is optional.
///
/// Fields stay raw JSON until every required one is known to be present.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<Value>,
    pub price: Option<Value>,
    pub image_url: Option<Value>,
    pub category_id: Option<Value>,
}

/// Payload for `PUT /api/products/{id}`.
///
/// Absent fields are left unchanged. `image_url: null` removes the image.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub category_id: Option<CategoryId>,
}

impl CreateProductRequest {
    /// Check required fields (in payload order) and normalize values.
    fn into_new_product(self) -> Result<NewProduct, ApiError> {
        let name = self.name.ok_or_else(|| ApiError::missing_field("name"))?;
        let price = self.price.ok_or_else(|| ApiError::missing_field("price"))?;
        let category_id = self
            .category_id
            .ok_or_else(|| ApiError::missing_field("category_id"))?;

        let name = normalize_name(&string_value(name, "name")?).map_err(ApiError::BadRequest)?;
        let price = price_value(&price)?;
        let category_id = category_id_value(&category_id)?;
        let image_url = match self.image_url {
            Some(url) => {
                normalize_image_url(&string_value(url, "image_url")?).map_err(ApiError::BadRequest)?
            }
            None => None,
        };

        Ok(NewProduct {
            name,
            price,
            image_url,
            category_id,
        })
    }
}

impl UpdateProductRequest {
    fn into_changes(self) -> Result<ProductChanges, ApiError> {
        let name = self
            .name
            .as_deref()
            .map(normalize_name)
            .transpose()
            .map_err(ApiError::BadRequest)?;

        let image_url = match self.image_url {
            Some(Some(url)) => Some(normalize_image_url(&url).map_err(ApiError::BadRequest)?),
            Some(None) => Some(None),
            None => None,
        };

        let price = self.price.as_ref().map(price_value).transpose()?;

        Ok(ProductChanges {
            name,
            price,
            image_url,
            category_id: self.category_id,
        })
    }
}

/// A price given as a JSON number (`9.5`) or string (`"9.50"`, `"$9.50"`).
fn price_value(value: &Value) -> Result<Price, ApiError> {
    let price = match value {
        Value::Number(n) => Price::parse(&n.to_string()),
        Value::String(s) => Price::parse(s),
        _ => Err(PriceError::Invalid),
    };
    price.map_err(|e| ApiError::BadRequest(format!("Price: {e}")))
}

/// A category ID given as a JSON integer or a numeric string.
fn category_id_value(value: &Value) -> Result<CategoryId, ApiError> {
    let id = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()).map(CategoryId::new),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| ApiError::BadRequest("The category_id field must be an integer".to_string()))
}

/// Reject a category ID that does not exist.
async fn ensure_category_exists(state: &AppState, id: CategoryId) -> Result<(), ApiError> {
    if CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!("Category {id} does not exist")));
    }
    Ok(())
}

/// Reject a name another product already uses.
async fn ensure_name_free(
    products: &ProductRepository<'_>,
    name: &str,
    exclude: Option<ProductId>,
) -> Result<(), ApiError> {
    if products.name_taken(name, exclude).await? {
        return Err(ApiError::BadRequest(format!("Product {name} already exists")));
    }
    Ok(())
}

/// List every product.
///
/// GET /api/products
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// Get one product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 if no such product exists.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>, ApiError> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Create a product.
///
/// POST /api/products
///
/// # Errors
///
/// Returns 401 without a valid token, 403 for non-admins, and 400 for a
/// missing or invalid field, a taken name or an unknown category.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    BearerAuth(user): BearerAuth,
    State(state): State<AppState>,
    body: Result<ApiJson<CreateProductRequest>, ApiError>,
) -> Result<Json<Product>, ApiError> {
    ensure_admin(&user, "create", "products")?;
    let ApiJson(body) = body?;
    let new_product = body.into_new_product()?;

    let products = ProductRepository::new(state.pool());
    ensure_name_free(&products, &new_product.name, None).await?;
    ensure_category_exists(&state, new_product.category_id).await?;

    let product = products.create(&new_product).await?;
    tracing::info!(product_id = %product.id, "Product created via API");
    Ok(Json(product))
}

/// Update a product.
///
/// PUT /api/products/{id}
///
/// # Errors
///
/// Returns 401 without a valid token, 403 for non-admins, 404 for an
/// unknown product, and 400 for invalid values.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn update(
    BearerAuth(user): BearerAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    body: Result<ApiJson<UpdateProductRequest>, ApiError>,
) -> Result<Json<Product>, ApiError> {
    ensure_admin(&user, "update", "products")?;

    let products = ProductRepository::new(state.pool());
    let existing = products.get_by_id(id).await?.ok_or(ApiError::NotFound)?;

    let ApiJson(body) = body?;
    let changes = body.into_changes()?;

    if let Some(name) = &changes.name {
        ensure_name_free(&products, name, Some(id)).await?;
    }
    if let Some(category_id) = changes.category_id
        && category_id != existing.category_id
    {
        ensure_category_exists(&state, category_id).await?;
    }

    let product = products.update(id, &changes).await?;
    tracing::info!("Product updated via API");
    Ok(Json(product))
}

/// Delete a product.
///
/// DELETE /api/products/{id}
///
/// # Errors
///
/// Returns 401 without a valid token, 403 for non-admins and 404 for an
/// unknown product.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn delete(
    BearerAuth(user): BearerAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode, ApiError> {
    ensure_admin(&user, "delete", "products")?;
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Product deleted via API");
    Ok(StatusCode::NO_CONTENT)
}
