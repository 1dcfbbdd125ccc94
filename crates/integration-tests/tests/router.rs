//! Router tests that never reach the database.
//!
//! The app runs with a pool pointing at a closed port and an in-memory
//! session store, so these cover authentication, redirects and payload
//! validation, which are all decided before any query runs.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE},
    },
    response::Response,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use shopfront_integration_tests::offline_app;

async fn send(request: Request<Body>) -> Response {
    offline_app().oneshot(request).await.unwrap()
}

async fn get(path: &str) -> Response {
    send(Request::get(path).body(Body::empty()).unwrap()).await
}

async fn post_form(path: &str, body: &str) -> Response {
    send(
        Request::post(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn send_json(method: Method, path: &str, body: &Value) -> Response {
    send(
        Request::builder()
            .method(method)
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

// ============================================================================
// Health & middleware
// ============================================================================

#[tokio::test]
async fn test_health() {
    let response = get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let response = get("/health").await;
    let headers = response.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
}

#[tokio::test]
async fn test_unknown_page_renders_not_found() {
    let response = get("/no/such/page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page not found"));
}

#[tokio::test]
async fn test_static_stylesheet_is_served() {
    let response = get("/static/css/main.css").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// HTML views
// ============================================================================

#[tokio::test]
async fn test_login_and_register_pages_render() {
    let response = get("/login").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("action=\"/login\""));
    assert!(body.contains("Register"));

    let response = get("/register").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("confirm_password"));
}

#[tokio::test]
async fn test_register_form_errors_rerender_with_400() {
    let response = post_form(
        "/register",
        "username=alice&email=alice%40example.com&password=hunter222&confirm_password=other",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_text(response).await;
    assert!(body.contains("Passwords must match"));
    // Entered values are kept, passwords are not.
    assert!(body.contains("value=\"alice\""));
    assert!(!body.contains("hunter222"));
}

#[tokio::test]
async fn test_login_form_requires_both_fields() {
    let response = post_form("/login", "username=&password=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_text(response).await;
    assert!(body.contains("Username is required"));
    assert!(body.contains("Password is required"));
}

#[tokio::test]
async fn test_product_pages_redirect_anonymous_visitors_to_login() {
    for path in ["/products/1", "/products/new", "/products/1/edit"] {
        let response = get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/login", "{path}");
    }

    let response = post_form("/products/1/delete", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_logout_redirects_home() {
    let response = get("/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = post_form("/logout", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// ============================================================================
// JSON API authentication
// ============================================================================

#[tokio::test]
async fn test_token_without_credentials_asks_for_basic_auth() {
    let response = send(Request::post("/api/token").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(
        response
            .headers()
            .get(WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Basic")
    );
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_malformed_basic_header_is_unauthorized() {
    let response = send(
        Request::post("/api/token")
            .header(AUTHORIZATION, "Basic not-base64!")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_mutations_without_token_are_unauthorized() {
    let cases = [
        (Method::DELETE, "/api/token"),
        (Method::PUT, "/api/users/1"),
        (Method::DELETE, "/api/users/1"),
        (Method::POST, "/api/products"),
        (Method::PUT, "/api/products/1"),
        (Method::DELETE, "/api/products/1"),
        (Method::POST, "/api/categories"),
    ];

    for (method, path) in cases {
        let response = send_json(method.clone(), path, &json!({})).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
        assert!(
            response
                .headers()
                .get(WWW_AUTHENTICATE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("Bearer"),
            "{method} {path}"
        );
    }
}

// ============================================================================
// JSON API validation
// ============================================================================

#[tokio::test]
async fn test_create_user_reports_missing_fields_in_order() {
    let cases = [
        (json!({}), "username"),
        (json!({"username": "alice"}), "email"),
        (json!({"username": "alice", "email": "alice@example.com"}), "password"),
        (json!({"username": 5, "password": ["x"]}), "email"),
        (
            json!({"username": null, "email": "alice@example.com", "password": "hunter222"}),
            "username",
        ),
    ];

    for (payload, field) in cases {
        let response = send_json(Method::POST, "/api/users", &payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": format!("You are missing the {field} field")})
        );
    }
}

#[tokio::test]
async fn test_create_user_rejects_invalid_values_before_storing() {
    let payload = json!({"username": "bad name", "email": "alice@example.com", "password": "hunter222"});
    let response = send_json(Method::POST, "/api/users", &payload).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("invalid username"));

    let payload = json!({"username": "alice", "email": "alice@example.com", "password": "short"});
    let response = send_json(Method::POST, "/api/users", &payload).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Password must be at least 8 characters"})
    );
}

#[tokio::test]
async fn test_create_user_rejects_non_string_values() {
    let payload = json!({"username": "alice", "email": 7, "password": "hunter222"});
    let response = send_json(Method::POST, "/api/users", &payload).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "The email field must be a string"})
    );
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let response = send(
        Request::post("/api/users")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = send(
        Request::post("/api/users")
            .body(Body::from("username=alice"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_api_path_is_json_not_found() {
    let response = get("/api/widgets").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_unparseable_api_id_is_json_not_found() {
    for path in [
        "/api/users/abc",
        "/api/products/99999999999",
        "/api/categories/-",
    ] {
        let response = get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_json(response).await, json!({"error": "Not found"}));
    }
}

#[tokio::test]
async fn test_unparseable_id_still_needs_a_token() {
    let response = send_json(Method::PUT, "/api/users/abc", &json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(WWW_AUTHENTICATE));
}
