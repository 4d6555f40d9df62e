//! Shared helpers for the API integration tests.
//!
//! Tests run against the full router over the in-memory store, so no
//! database needs to be up.

use std::sync::Arc;

use axum_test::TestServer;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use catalog_backend::AppState;
use catalog_backend::api_router;
use catalog_backend::entities::currencies;
use catalog_backend::services::{auth::AuthService, pricing::PricingService};
use catalog_backend::store::in_memory::InMemoryStore;

pub struct TestApp {
    pub server: TestServer,
    #[allow(dead_code)]
    pub store: Arc<InMemoryStore>,
    #[allow(dead_code)]
    pub usd: currencies::Model,
    #[allow(dead_code)]
    pub eur: currencies::Model,
}

/// Router over a fresh in-memory store with the two demo currencies seeded.
pub fn spawn_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let usd = store.add_currency("US Dollar", "$", dec!(1.0));
    let eur = store.add_currency("Euro", "€", dec!(0.92));

    let state = AppState {
        auth: AuthService::new(store.clone(), "test-secret".to_string(), 3600),
        pricing: PricingService::new(store.clone(), store.clone()),
    };

    let server = TestServer::new(api_router(state)).expect("failed to start test server");

    TestApp {
        server,
        store,
        usd,
        eur,
    }
}

/// Registers a fresh user and returns a bearer token for them.
#[allow(dead_code)]
pub async fn auth_token(server: &TestServer) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "correct horse"
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "ada@example.com",
            "password": "correct horse"
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    body["access_token"]
        .as_str()
        .expect("login response carries access_token")
        .to_string()
}
