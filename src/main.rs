use std::env;
use std::sync::Arc;

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_backend::services::{auth::AuthService, pricing::PricingService};
use catalog_backend::store::postgres::PostgresStore;
use catalog_backend::{AppState, api_router};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catalog_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let token_ttl_secs = env::var("JWT_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(3600);

    let store = Arc::new(PostgresStore::new(db));
    let state = AppState {
        auth: AuthService::new(store.clone(), jwt_secret, token_ttl_secs),
        pricing: PricingService::new(store.clone(), store),
    };

    // Build router
    let app = api_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
