//! Product route handlers for the HTML views.
//!
//! Viewing a product requires a login; creating, editing and deleting
//! require an administrator.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{FromRequestParts, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{CategoryId, Price, ProductId};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::flash::{self, FlashLevel};
use crate::middleware::{RequireAdmin, RequireLogin};
use crate::models::product::{normalize_image_url, normalize_name};
use crate::models::{Category, NewProduct, Product, ProductChanges};
use crate::page::PageContext;
use crate::state::AppState;

/// `axum::extract::Path` with rejections reported as [`AppError`], so an
/// ID that does not parse gets the rendered 404 page.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ProductPath<T>(pub T);

// =============================================================================
// Form Types
// =============================================================================

/// Product create/edit form data. Every field arrives as text.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub category_id: String,
}

impl ProductForm {
    /// Prefill the form from an existing product.
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.amount().to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            category_id: product.category_id.to_string(),
        }
    }

    /// Validate the form without touching the database.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid field.
    pub fn parse(&self) -> std::result::Result<NewProduct, Vec<String>> {
        let mut errors = Vec::new();

        let name = normalize_name(&self.name).map_err(|e| errors.push(e));

        let price = Price::parse(&self.price).map_err(|e| {
            errors.push(format!("Price: {e}"));
        });

        let image_url = normalize_image_url(&self.image_url).map_err(|e| errors.push(e));

        let category_id = self
            .category_id
            .parse::<CategoryId>()
            .map_err(|_| errors.push("Choose a category".to_string()));

        match (name, price, image_url, category_id) {
            (Ok(name), Ok(price), Ok(image_url), Ok(category_id)) => Ok(NewProduct {
                name,
                price,
                image_url,
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// A category in the form's select box.
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
    pub selected: bool,
}

fn category_options(categories: Vec<Category>, selected: &str) -> Vec<CategoryOption> {
    let selected = selected.parse::<CategoryId>().ok();
    categories
        .into_iter()
        .map(|c| CategoryOption {
            selected: Some(c.id) == selected,
            id: c.id,
            name: c.name,
        })
        .collect()
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductTemplate {
    pub page: PageContext,
    pub product: Product,
    pub category: Option<Category>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub heading: String,
    pub action: String,
    pub submit_label: &'static str,
    pub errors: Vec<String>,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
}

/// Which form is being rendered.
enum FormMode {
    Create,
    Edit { id: ProductId, name: String },
}

async fn render_form(
    state: &AppState,
    page: PageContext,
    mode: FormMode,
    form: ProductForm,
    errors: Vec<String>,
) -> Result<Response> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    let (heading, action, submit_label) = match mode {
        FormMode::Create => (
            "New product".to_string(),
            "/products/new".to_string(),
            "Create product",
        ),
        FormMode::Edit { id, name } => (
            format!("Edit {name}"),
            format!("/products/{id}/edit"),
            "Save changes",
        ),
    };

    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    let template = ProductFormTemplate {
        page,
        heading,
        action,
        submit_label,
        errors,
        categories: category_options(categories, &form.category_id),
        form,
    };
    Ok((status, template).into_response())
}

/// Database-backed checks: the category must exist and the name must be
/// free (ignoring the product being edited).
async fn check_against_store(
    state: &AppState,
    product: &NewProduct,
    exclude: Option<ProductId>,
) -> Result<Vec<String>> {
    let mut errors = Vec::new();
    if CategoryRepository::new(state.pool())
        .get_by_id(product.category_id)
        .await?
        .is_none()
    {
        errors.push("Choose a category".to_string());
    }
    if ProductRepository::new(state.pool())
        .name_taken(&product.name, exclude)
        .await?
    {
        errors.push(format!("Product {} already exists", product.name));
    }
    Ok(errors)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a product.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn show(
    RequireLogin(_user): RequireLogin,
    State(state): State<AppState>,
    page: PageContext,
    ProductPath(id): ProductPath<ProductId>,
) -> Result<impl IntoResponse> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    let category = CategoryRepository::new(state.pool())
        .get_by_id(product.category_id)
        .await?;

    Ok(ProductTemplate {
        page,
        product,
        category,
    })
}

/// Display the new-product form.
pub async fn new_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Response> {
    render_form(&state, page, FormMode::Create, ProductForm::default(), Vec::new()).await
}

/// Handle new-product form submission.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let new_product = match form.parse() {
        Ok(product) => product,
        Err(errors) => {
            let page = PageContext::load(&session, &state).await?;
            return render_form(&state, page, FormMode::Create, form, errors).await;
        }
    };

    let errors = check_against_store(&state, &new_product, None).await?;
    if !errors.is_empty() {
        let page = PageContext::load(&session, &state).await?;
        return render_form(&state, page, FormMode::Create, form, errors).await;
    }

    let product = match ProductRepository::new(state.pool()).create(&new_product).await {
        Ok(product) => product,
        Err(RepositoryError::Conflict(message)) => {
            let page = PageContext::load(&session, &state).await?;
            return render_form(&state, page, FormMode::Create, form, vec![message]).await;
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(product_id = %product.id, "Product created");
    flash::push(
        &session,
        FlashLevel::Primary,
        format!("{} has been created", product.name),
    )
    .await;
    Ok(Redirect::to(&format!("/products/{}", product.id)).into_response())
}

/// Display the edit form for a product.
pub async fn edit_page(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    page: PageContext,
    ProductPath(id): ProductPath<ProductId>,
) -> Result<Response> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mode = FormMode::Edit {
        id,
        name: product.name.clone(),
    };
    render_form(&state, page, mode, ProductForm::from_product(&product), Vec::new()).await
}

/// Handle edit form submission.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    ProductPath(id): ProductPath<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let products = ProductRepository::new(state.pool());
    let existing = products.get_by_id(id).await?.ok_or(AppError::NotFound)?;
    let mode = || FormMode::Edit {
        id,
        name: existing.name.clone(),
    };

    let parsed = match form.parse() {
        Ok(product) => product,
        Err(errors) => {
            let page = PageContext::load(&session, &state).await?;
            return render_form(&state, page, mode(), form, errors).await;
        }
    };

    let errors = check_against_store(&state, &parsed, Some(id)).await?;
    if !errors.is_empty() {
        let page = PageContext::load(&session, &state).await?;
        return render_form(&state, page, mode(), form, errors).await;
    }

    let changes = ProductChanges {
        name: Some(parsed.name),
        price: Some(parsed.price),
        image_url: Some(parsed.image_url),
        category_id: Some(parsed.category_id),
    };
    let product = match products.update(id, &changes).await {
        Ok(product) => product,
        Err(RepositoryError::Conflict(message)) => {
            let page = PageContext::load(&session, &state).await?;
            return render_form(&state, page, mode(), form, vec![message]).await;
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Product updated");
    flash::push(
        &session,
        FlashLevel::Primary,
        format!("{} has been updated", product.name),
    )
    .await;
    Ok(Redirect::to(&format!("/products/{}", product.id)).into_response())
}

/// Delete a product.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    ProductPath(id): ProductPath<ProductId>,
) -> Result<Redirect> {
    let products = ProductRepository::new(state.pool());
    let product = products.get_by_id(id).await?.ok_or(AppError::NotFound)?;
    products.delete(id).await?;

    tracing::info!("Product deleted");
    flash::push(
        &session,
        FlashLevel::Danger,
        format!("{} has been deleted", product.name),
    )
    .await;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn form(name: &str, price: &str, image_url: &str, category_id: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            price: price.to_string(),
            image_url: image_url.to_string(),
            category_id: category_id.to_string(),
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let product = form(" Mug ", "$12.5", "", "3").parse().unwrap();
        assert_eq!(product.name, "Mug");
        assert_eq!(product.price.amount(), Decimal::new(1250, 2));
        assert_eq!(product.image_url, None);
        assert_eq!(product.category_id, CategoryId::new(3));
    }

    #[test]
    fn test_parse_reports_every_bad_field() {
        let errors = form("", "-1", "ftp://files", "x").parse().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Name is required",
                "Price: price cannot be negative",
                "Image URL must start with http:// or https://",
                "Choose a category",
            ]
        );
    }

    #[tokio::test]
    async fn test_unparseable_product_id_renders_not_found() {
        use axum::{Router, body::Body, http::Request, routing::get};
        use tower::ServiceExt;

        let app = Router::new().route(
            "/products/{id}",
            get(|ProductPath(id): ProductPath<ProductId>| async move { id.to_string() }),
        );

        let response = app
            .oneshot(Request::get("/products/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8(bytes.to_vec()).unwrap().contains("Page not found"));
    }

    #[test]
    fn test_category_options_marks_selection() {
        let categories = vec![
            Category {
                id: CategoryId::new(1),
                name: "Mugs".to_string(),
            },
            Category {
                id: CategoryId::new(2),
                name: "Shirts".to_string(),
            },
        ];
        let options = category_options(categories, "2");
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }
}
