//! HTTP route handlers for the shop.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page (product listing)
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database)
//!
//! # Auth
//! GET  /register                 - Registration page
//! POST /register                 - Registration action
//! GET  /login                    - Login page
//! POST /login                    - Login action
//! GET  /logout                   - Logout action
//! POST /logout                   - Logout action
//!
//! # Products (login required; writes require admin)
//! GET  /products/new             - New product form
//! POST /products/new             - Create product
//! GET  /products/{id}            - Product detail
//! GET  /products/{id}/edit       - Edit product form
//! POST /products/{id}/edit       - Update product
//! POST /products/{id}/delete     - Delete product
//!
//! # JSON API (see `api`)
//! POST   /api/token              - Issue token (HTTP Basic)
//! DELETE /api/token              - Revoke token (Bearer)
//! GET    /api/users              - List users
//! POST   /api/users              - Register user
//! GET    /api/users/{id}         - Get user
//! PUT    /api/users/{id}         - Update own account (Bearer)
//! DELETE /api/users/{id}         - Delete own account (Bearer)
//! GET    /api/products           - List products
//! POST   /api/products           - Create product (Bearer, admin)
//! GET    /api/products/{id}      - Get product
//! PUT    /api/products/{id}      - Update product (Bearer, admin)
//! DELETE /api/products/{id}      - Delete product (Bearer, admin)
//! GET    /api/categories         - List categories
//! POST   /api/categories         - Create category (Bearer, admin)
//! GET    /api/categories/{id}    - Get category
//! ```

pub mod api;
pub mod auth;
pub mod home;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tower_sessions::{SessionManagerLayer, SessionStore, service::SignedCookie};
use tracing::Span;

use crate::error::{ApiError, AppError};
use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create the registration, login and logout routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/new", get(products::new_page).post(products::create))
        .route("/{id}", get(products::show))
        .route("/{id}/edit", get(products::edit_page).post(products::edit))
        .route("/{id}/delete", post(products::delete))
}

/// Create all routes for the shop.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth_routes())
        .nest("/products", product_routes())
        .nest(
            "/api",
            api::api_routes().fallback(|| async { ApiError::NotFound }),
        )
        .fallback(|| async { AppError::NotFound })
}

/// Assemble the full application: routes, static files, sessions, security
/// headers, request IDs and request tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S, SignedCookie>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .merge(routes())
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(session_layer)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        #[allow(clippy::cast_possible_truncation)]
                        span.record("latency_ms", latency.as_millis() as u64);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
