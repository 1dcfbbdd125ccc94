//! Category API endpoints.

use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use shopfront_core::CategoryId;

use super::{ApiJson, ApiPath, string_value};
use crate::db::CategoryRepository;
use crate::error::ApiError;
use crate::middleware::BearerAuth;
use crate::models::Category;
use crate::models::product::normalize_name;
use crate::services::access::ensure_admin;
use crate::state::AppState;

/// Payload for `POST /api/categories`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<Value>,
}

/// List every category, ordered by name.
///
/// GET /api/categories
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// Get one category.
///
/// GET /api/categories/{id}
///
/// # Errors
///
/// Returns 404 if no such category exists.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>, ApiError> {
    CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Create a category.
///
/// POST /api/categories
///
/// # Errors
///
/// Returns 401 without a valid token, 403 for non-admins, and 400 for a
/// missing or duplicate name.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    BearerAuth(user): BearerAuth,
    State(state): State<AppState>,
    body: Result<ApiJson<CreateCategoryRequest>, ApiError>,
) -> Result<Json<Category>, ApiError> {
    ensure_admin(&user, "create", "categories")?;
    let ApiJson(body) = body?;

    let name = body.name.ok_or_else(|| ApiError::missing_field("name"))?;
    let name = string_value(name, "name")?;
    let name = normalize_name(&name).map_err(ApiError::BadRequest)?;

    let categories = CategoryRepository::new(state.pool());
    if categories.get_by_name(&name).await?.is_some() {
        return Err(ApiError::BadRequest(format!("Category {name} already exists")));
    }

    let category = categories.create(&name).await?;
    tracing::info!(category_id = %category.id, "Category created via API");
    Ok(Json(category))
}
