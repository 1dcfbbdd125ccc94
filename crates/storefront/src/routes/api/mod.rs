//! JSON API routes.
//!
//! Every error is answered with `{"error": "..."}` and the matching status
//! code. Reads are public; writes need a bearer token obtained from
//! `POST /api/token` with HTTP Basic credentials.

pub mod categories;
pub mod products;
pub mod tokens;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// `axum::Json` with rejections reported as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections reported as [`ApiError`].
///
/// An ID that does not parse is answered like an unknown one: 404.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// A payload value that must be a JSON string.
///
/// Create payloads take their fields as raw JSON so that every missing field
/// is reported before any wrongly typed one.
fn string_value(value: Value, field: &str) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ApiError::BadRequest(format!("The {field} field must be a string"))),
    }
}

/// Deserialize a field that may be absent (`None`), `null` (`Some(None)`)
/// or set (`Some(Some(_))`). Use together with `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(tokens::issue).delete(tokens::revoke))
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route("/categories/{id}", get(categories::show))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use shopfront_core::ProductId;

    use super::*;

    async fn get_product_id(path: &str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route(
            "/products/{id}",
            get(|ApiPath(id): ApiPath<ProductId>| async move { id.to_string() }),
        );
        let response = app
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_api_path_unparseable_id_is_json_not_found() {
        for path in ["/products/abc", "/products/99999999999", "/products/1.5"] {
            let (status, body) = get_product_id(path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body, serde_json::json!({"error": "Not found"}), "{path}");
        }
    }

    #[test]
    fn test_string_value() {
        assert_eq!(
            string_value(serde_json::json!("alice"), "username").unwrap(),
            "alice"
        );
        let err = string_value(serde_json::json!(5), "username").unwrap_err();
        assert_eq!(err.to_string(), "The username field must be a string");
    }

    #[tokio::test]
    async fn test_api_path_passes_valid_id() {
        let (status, _) = get_product_id("/products/42").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        image_url: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.image_url, None);

        let null: Patch = serde_json::from_str(r#"{"image_url": null}"#).unwrap();
        assert_eq!(null.image_url, Some(None));

        let set: Patch = serde_json::from_str(r#"{"image_url": "https://img.test/a.png"}"#).unwrap();
        assert_eq!(
            set.image_url,
            Some(Some("https://img.test/a.png".to_string()))
        );
    }
}
