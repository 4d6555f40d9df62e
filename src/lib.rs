// src/lib.rs

use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use services::{auth::AuthService, pricing::PricingService};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub pricing: PricingService,
}

pub mod entities {
    pub mod prelude;
    pub mod currencies;
    pub mod product_prices;
    pub mod products;
    pub mod users;
}

pub mod services {
    pub mod auth;
    pub mod conversion;
    pub mod pricing;
}

pub mod handlers;
pub mod models;
pub mod store;

/// Builds the full `/api` router over the given state. Everything except
/// health, register and login sits behind the bearer-token middleware.
pub fn api_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    let protected = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/me", post(handlers::auth::me))
        .route(
            "/products",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::product::get_product)
                .put(handlers::product::update_product)
                .delete(handlers::product::delete_product),
        )
        .route(
            "/products/{id}/prices",
            get(handlers::price::list_product_prices).post(handlers::price::add_product_price),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::require_auth,
        ));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
