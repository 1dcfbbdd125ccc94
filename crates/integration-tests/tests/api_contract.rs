//! JSON API contract tests against a live server and database.
//!
//! These tests require a `PostgreSQL` database in
//! `SHOPFRONT_TEST_DATABASE_URL`. Run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use shopfront::db::{CategoryRepository, ProductRepository, RepositoryError};
use shopfront::models::{NewProduct, ProductChanges};
use shopfront_core::{CategoryId, Price};
use shopfront_integration_tests::{TEST_PASSWORD, TestServer, unique_name};

// ============================================================================
// Tokens
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_token_is_reused_until_revoked() {
    let server = TestServer::start().await;
    let user = server.create_user(false).await;

    let first = server.token_for(&user).await;
    let second = server.token_for(&user).await;
    assert_eq!(first, second);

    let client = server.client();
    let response = client
        .delete(server.url("/api/token"))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.bytes().await.unwrap().is_empty());

    // A revoked token no longer authenticates.
    let response = client
        .delete(server.url("/api/token"))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_ne!(server.token_for(&user).await, first);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_wrong_password_gets_no_token() {
    let server = TestServer::start().await;
    let user = server.create_user(false).await;

    let response = server
        .client()
        .post(server.url("/api/token"))
        .basic_auth(user.username.as_str(), Some("not the password"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_create_user_returns_public_fields() {
    let server = TestServer::start().await;
    let username = unique_name("api");
    let email = format!("{username}@example.com");

    let response = server
        .client()
        .post(server.url("/api/users"))
        .json(&json!({"username": username, "email": email, "password": TEST_PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], json!(username));
    assert_eq!(body["email"], json!(email));
    assert_eq!(body["is_admin"], json!(false));
    assert!(body["id"].is_i64());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("token").is_none());

    let id = body["id"].as_i64().unwrap();
    let fetched: Value = server
        .client()
        .get(server.url(&format!("/api/users/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, body);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_duplicate_user_is_rejected() {
    let server = TestServer::start().await;
    let existing = server.create_user(false).await;

    let response = server
        .client()
        .post(server.url("/api/users"))
        .json(&json!({
            "username": existing.username.as_str(),
            "email": "someone.else@example.com",
            "password": TEST_PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        json!(format!(
            "User with username {} or email someone.else@example.com already exists",
            existing.username
        ))
    );
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_unknown_user_is_not_found() {
    let server = TestServer::start().await;
    let response = server
        .client()
        .get(server.url("/api/users/2147483647"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"error": "Not found"})
    );
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_users_can_only_change_themselves() {
    let server = TestServer::start().await;
    let alice = server.create_user(false).await;
    let bob = server.create_user(false).await;
    let token = server.token_for(&alice).await;
    let client = server.client();

    let response = client
        .put(server.url(&format!("/api/users/{}", bob.id)))
        .bearer_auth(&token)
        .json(&json!({"email": "stolen@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"error": "You do not have access to update this user"})
    );

    let response = client
        .delete(server.url(&format!("/api/users/{}", bob.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_update_self_is_partial_and_ignores_admin_flag() {
    let server = TestServer::start().await;
    let user = server.create_user(false).await;
    let token = server.token_for(&user).await;
    let new_email = format!("{}@example.org", unique_name("moved"));

    let response = server
        .client()
        .put(server.url(&format!("/api/users/{}", user.id)))
        .bearer_auth(&token)
        .json(&json!({"email": new_email, "is_admin": true, "id": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], json!(new_email));
    assert_eq!(body["username"], json!(user.username.as_str()));
    assert_eq!(body["is_admin"], json!(false));
    assert_eq!(body["id"], json!(user.id.as_i32()));
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_update_self_to_taken_username_is_rejected() {
    let server = TestServer::start().await;
    let user = server.create_user(false).await;
    let other = server.create_user(false).await;
    let token = server.token_for(&user).await;

    let response = server
        .client()
        .put(server.url(&format!("/api/users/{}", user.id)))
        .bearer_auth(&token)
        .json(&json!({"username": other.username.as_str()}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_delete_self() {
    let server = TestServer::start().await;
    let user = server.create_user(false).await;
    let token = server.token_for(&user).await;
    let client = server.client();

    let response = client
        .delete(server.url(&format!("/api/users/{}", user.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(server.url(&format!("/api/users/{}", user.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Products & categories
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_non_admin_cannot_write_products() {
    let server = TestServer::start().await;
    let user = server.create_user(false).await;
    let category = server.create_category().await;
    let token = server.token_for(&user).await;

    let response = server
        .client()
        .post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({"name": unique_name("mug"), "price": 10, "category_id": category.id.as_i32()}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"error": "You do not have access to create products"})
    );
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_admin_product_lifecycle() {
    let server = TestServer::start().await;
    let admin = server.create_user(true).await;
    let category = server.create_category().await;
    let token = server.token_for(&admin).await;
    let client = server.client();
    let name = unique_name("mug");

    // Create
    let response = client
        .post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({
            "name": name,
            "price": "12.5",
            "image_url": "https://img.example.com/mug.png",
            "category_id": category.id.as_i32(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["name"], json!(name));
    assert_eq!(created["price"], json!("12.50"));
    assert_eq!(created["category_id"], json!(category.id.as_i32()));
    let id = created["id"].as_i64().unwrap();

    // Duplicate name
    let response = client
        .post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({"name": name, "price": 1, "category_id": category.id.as_i32()}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"error": format!("Product {name} already exists")})
    );

    // Partial update clears the image and keeps the name
    let response = client
        .put(server.url(&format!("/api/products/{id}")))
        .bearer_auth(&token)
        .json(&json!({"price": 20, "image_url": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], json!(name));
    assert_eq!(updated["price"], json!("20.00"));
    assert_eq!(updated["image_url"], Value::Null);

    // Delete
    let response = client
        .delete(server.url(&format!("/api/products/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(server.url(&format!("/api/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(server.url(&format!("/api/products/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_product_with_unknown_category_is_rejected() {
    let server = TestServer::start().await;
    let admin = server.create_user(true).await;
    let token = server.token_for(&admin).await;

    let response = server
        .client()
        .post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({"name": unique_name("orphan"), "price": 1, "category_id": 2_147_483_647}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"error": "Category 2147483647 does not exist"})
    );
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_admin_creates_category() {
    let server = TestServer::start().await;
    let admin = server.create_user(true).await;
    let token = server.token_for(&admin).await;
    let client = server.client();
    let name = unique_name("cat");

    let response = client
        .post(server.url("/api/categories"))
        .bearer_auth(&token)
        .json(&json!({"name": name}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let category: Value = response.json().await.unwrap();
    assert_eq!(category["name"], json!(name));

    let response = client
        .post(server.url("/api/categories"))
        .bearer_auth(&token)
        .json(&json!({"name": name}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"error": format!("Category {name} already exists")})
    );

    let listed: Vec<Value> = client
        .get(server.url("/api/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.iter().any(|c| c["name"] == json!(name)));
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_category_in_use_cannot_be_deleted() {
    let server = TestServer::start().await;
    let admin = server.create_user(true).await;
    let category = server.create_category().await;
    let token = server.token_for(&admin).await;
    let client = server.client();

    let product: Value = client
        .post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({"name": unique_name("mug"), "price": 3, "category_id": category.id.as_i32()}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let categories = CategoryRepository::new(&server.pool);
    assert!(matches!(
        categories.delete(category.id).await,
        Err(RepositoryError::Conflict(_))
    ));

    let response = client
        .delete(server.url(&format!("/api/products/{}", product["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    categories.delete(category.id).await.unwrap();
    assert!(matches!(
        categories.delete(category.id).await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_product_writes_report_the_violated_constraint() {
    let server = TestServer::start().await;
    let category = server.create_category().await;
    let products = ProductRepository::new(&server.pool);
    let missing = CategoryId::new(i32::MAX);

    let orphan = NewProduct {
        name: unique_name("orphan"),
        price: Price::parse("1").unwrap(),
        image_url: None,
        category_id: missing,
    };
    assert!(matches!(
        products.create(&orphan).await,
        Err(RepositoryError::Conflict(ref m)) if *m == format!("Category {missing} does not exist")
    ));

    let first = products
        .create(&NewProduct {
            category_id: category.id,
            ..orphan
        })
        .await
        .unwrap();
    let second = products
        .create(&NewProduct {
            name: unique_name("other"),
            price: Price::parse("2").unwrap(),
            image_url: None,
            category_id: category.id,
        })
        .await
        .unwrap();

    let rename = ProductChanges {
        name: Some(first.name.clone()),
        ..ProductChanges::default()
    };
    assert!(matches!(
        products.update(second.id, &rename).await,
        Err(RepositoryError::Conflict(ref m)) if *m == format!("Product {} already exists", first.name)
    ));

    let move_category = ProductChanges {
        category_id: Some(missing),
        ..ProductChanges::default()
    };
    assert!(matches!(
        products.update(second.id, &move_category).await,
        Err(RepositoryError::Conflict(ref m)) if *m == format!("Category {missing} does not exist")
    ));
}
