//! Persistence seam for the catalog.
//!
//! The traits here describe exactly what the services need from storage:
//! a product store with explicit relation loading, a read-only currency
//! registry, and a user store for authentication. `postgres` implements
//! them over SeaORM for runtime; `in_memory` backs tests and local runs.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::entities::{currencies, product_prices, products, users};

pub mod in_memory;
pub mod postgres;

#[derive(Debug)]
pub enum StoreError {
    /// Identifier did not resolve to a row
    NotFound(String),
    /// Backend failure: connection, constraint violation, serialization
    Database(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Fields for a new product row; ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency_id: i32,
    pub tax_cost: Decimal,
    pub manufacturing_cost: Decimal,
}

/// Partial product update; only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency_id: Option<i32>,
    pub tax_cost: Option<Decimal>,
    pub manufacturing_cost: Option<Decimal>,
}

/// One ledger row for bulk insertion during derivation.
#[derive(Debug, Clone)]
pub struct NewPrice {
    pub currency_id: i32,
    pub price: Decimal,
}

/// A product with its native currency and full price ledger attached.
/// Currency slots are `None` when the referenced row is gone, mirroring
/// the nullable join the relational backend produces.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: products::Model,
    pub currency: Option<currencies::Model>,
    pub prices: Vec<(product_prices::Model, Option<currencies::Model>)>,
}

/// Fields for a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create_product(&self, fields: NewProduct) -> Result<products::Model, StoreError>;

    /// Plain row fetch, used for existence checks before ledger operations.
    async fn get_product(&self, id: i32) -> Result<products::Model, StoreError>;

    /// Product plus native currency plus ledger rows with their currencies.
    async fn get_product_detail(&self, id: i32) -> Result<ProductDetail, StoreError>;

    /// One page of products with their native currencies, plus the total
    /// row count. `page` is 1-based.
    async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<(products::Model, Option<currencies::Model>)>, u64), StoreError>;

    async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<products::Model, StoreError>;

    /// Removes the product; its ledger rows go with it.
    async fn delete_product(&self, id: i32) -> Result<(), StoreError>;

    /// Ledger rows for one product, oldest first. Empty when the product has
    /// no rows; whether the product exists at all is the caller's concern.
    async fn list_prices(
        &self,
        product_id: i32,
    ) -> Result<Vec<(product_prices::Model, Option<currencies::Model>)>, StoreError>;

    /// Inserts one ledger row inside a transaction that locks the owning
    /// product row, so concurrent writers to the same ledger serialize.
    /// Duplicate (product, currency) pairs are allowed; currency existence
    /// is left to the schema's foreign key.
    async fn add_price(
        &self,
        product_id: i32,
        currency_id: i32,
        price: Decimal,
    ) -> Result<product_prices::Model, StoreError>;

    /// Bulk variant of [`add_price`](ProductStore::add_price): all rows land
    /// in one transaction or none do.
    async fn add_prices(
        &self,
        product_id: i32,
        rows: Vec<NewPrice>,
    ) -> Result<Vec<product_prices::Model>, StoreError>;
}

/// Read-only lookup of currencies and their reference exchange rates.
/// Currency administration has no API surface; rows arrive via seeding.
#[async_trait]
pub trait CurrencyRegistry: Send + Sync {
    async fn rate_of(&self, currency_id: i32) -> Result<Decimal, StoreError>;

    async fn list_all(&self) -> Result<Vec<currencies::Model>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, fields: NewUser) -> Result<users::Model, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError>;

    async fn find_user(&self, id: i32) -> Result<Option<users::Model>, StoreError>;
}
