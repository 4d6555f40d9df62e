//! Integration tests for the product and price ledger endpoints.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use common::{auth_token, spawn_app};

async fn create_widget(server: &TestServer, token: &str, currency_id: i32) -> i64 {
    let response = server
        .post("/api/products")
        .authorization_bearer(token)
        .json(&json!({
            "name": "Widget",
            "description": "A widget",
            "price": 100.0,
            "currency_id": currency_id,
            "tax_cost": 8.0,
            "manufacturing_cost": 35.0
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app();

    let response = app.server.get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn product_routes_require_a_token() {
    let app = spawn_app();

    app.server
        .get("/api/products")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .post("/api/products")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .get("/api/products/1/prices")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_product_returns_the_new_row() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;

    let response = app
        .server
        .post("/api/products")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Widget",
            "description": "A widget",
            "price": 100.0,
            "currency_id": app.usd.id,
            "tax_cost": 8.0,
            "manufacturing_cost": 35.0
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["name"], "Widget");
    assert_eq!(body["price"], 100.0);
    assert_eq!(body["currency_id"], app.usd.id);
    assert!(body["created_at"].as_str().is_some());
}

#[tokio::test]
async fn create_product_rejects_bad_payloads() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;

    // Negative price
    let response = app
        .server
        .post("/api/products")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Widget",
            "description": "A widget",
            "price": -1.0,
            "currency_id": app.usd.id,
            "tax_cost": 8.0,
            "manufacturing_cost": 35.0
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    // Blank name
    let response = app
        .server
        .post("/api/products")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "  ",
            "description": "A widget",
            "price": 1.0,
            "currency_id": app.usd.id,
            "tax_cost": 0.0,
            "manufacturing_cost": 0.0
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_product_includes_currency_and_ledger() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    app.server
        .post(&format!("/api/products/{}/prices", id))
        .authorization_bearer(&token)
        .json(&json!({ "currency_id": app.eur.id, "price": 92.0 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get(&format!("/api/products/{}", id))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["currency"]["name"], "US Dollar");
    assert_eq!(body["currency"]["symbol"], "$");

    let prices = body["prices"].as_array().unwrap();
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0]["price"], 92.0);
    assert_eq!(prices[0]["currency"]["name"], "Euro");
}

#[tokio::test]
async fn get_missing_product_is_not_found() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;

    let response = app
        .server
        .get("/api/products/9999")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("9999"));
}

#[tokio::test]
async fn listing_paginates_with_total() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    for _ in 0..3 {
        create_widget(&app.server, &token, app.usd.id).await;
    }

    let response = app
        .server
        .get("/api/products?page=1&per_page=2")
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 2);
    assert_eq!(body["total"], 3);

    let response = app
        .server
        .get("/api/products?page=2&per_page=2")
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // List rows carry the native currency object
    assert_eq!(body["data"][0]["currency"]["symbol"], "$");
}

#[tokio::test]
async fn update_changes_only_sent_fields() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    let response = app
        .server
        .put(&format!("/api/products/{}", id))
        .authorization_bearer(&token)
        .json(&json!({ "name": "Gadget" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Gadget");
    assert_eq!(body["price"], 100.0);
    assert_eq!(body["description"], "A widget");
}

#[tokio::test]
async fn update_missing_product_is_not_found() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;

    let response = app
        .server
        .put("/api/products/9999")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Gadget" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_product_and_ledger() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    app.server
        .post(&format!("/api/products/{}/prices", id))
        .authorization_bearer(&token)
        .json(&json!({ "currency_id": app.eur.id, "price": 92.0 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .delete(&format!("/api/products/{}", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Product deleted successfully");

    app.server
        .get(&format!("/api/products/{}", id))
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(app.store.price_row_count(), 0);

    let response = app
        .server
        .delete(&format!("/api/products/{}", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ledger_listing_for_missing_product_is_not_found() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;

    let response = app
        .server
        .get("/api/products/9999/prices")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_ledger_lists_as_empty_array() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    let response = app
        .server
        .get(&format!("/api/products/{}/prices", id))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn add_price_rounds_and_returns_the_row() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    let response = app
        .server
        .post(&format!("/api/products/{}/prices", id))
        .authorization_bearer(&token)
        .json(&json!({ "currency_id": app.eur.id, "price": 92.005 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["price"], 92.01);
    assert_eq!(body["currency_id"], app.eur.id);
    assert_eq!(body["product_id"], id);
}

#[tokio::test]
async fn add_price_to_missing_product_is_not_found() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;

    let response = app
        .server
        .post("/api/products/9999/prices")
        .authorization_bearer(&token)
        .json(&json!({ "currency_id": app.eur.id, "price": 92.0 }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(app.store.price_row_count(), 0);
}

#[tokio::test]
async fn add_price_rejects_negative_amounts() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    let response = app
        .server
        .post(&format!("/api/products/{}/prices", id))
        .authorization_bearer(&token)
        .json(&json!({ "currency_id": app.eur.id, "price": -5.0 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn add_price_accepts_unknown_currency_id() {
    // The HTTP layer leaves currency existence to the schema; the
    // in-memory store has no foreign keys, so the row just lands.
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    let response = app
        .server
        .post(&format!("/api/products/{}/prices", id))
        .authorization_bearer(&token)
        .json(&json!({ "currency_id": 999, "price": 5.0 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["currency_id"], 999);
    assert!(body.get("currency").is_none());
}

#[tokio::test]
async fn duplicate_ledger_rows_accumulate() {
    let app = spawn_app();
    let token = auth_token(&app.server).await;
    let id = create_widget(&app.server, &token, app.usd.id).await;

    for _ in 0..2 {
        app.server
            .post(&format!("/api/products/{}/prices", id))
            .authorization_bearer(&token)
            .json(&json!({ "currency_id": app.eur.id, "price": 92.0 }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = app
        .server
        .get(&format!("/api/products/{}/prices", id))
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 2);
}
