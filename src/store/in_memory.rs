//! In-memory store used by tests and local development.
//!
//! Mirrors the Postgres store's observable behavior with two deliberate
//! exceptions of the schema layer: there are no foreign keys, so ledger
//! rows with unknown currency ids are accepted, and the "transaction"
//! around bulk inserts is simply holding the table lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::entities::{currencies, product_prices, products, users};

use super::{
    CurrencyRegistry, NewPrice, NewProduct, NewUser, ProductChanges, ProductDetail, ProductStore,
    StoreError, UserStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<i32, users::Model>,
    currencies: HashMap<i32, currencies::Model>,
    products: HashMap<i32, products::Model>,
    product_prices: HashMap<i32, product_prices::Model>,
    next_user_id: i32,
    next_currency_id: i32,
    next_product_id: i32,
    next_price_id: i32,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a currency. The registry trait is read-only, so seeding
    /// happens through this inherent method.
    pub fn add_currency(&self, name: &str, symbol: &str, exchange_rate: Decimal) -> currencies::Model {
        let mut tables = self.tables.lock();
        tables.next_currency_id += 1;
        let now = Utc::now().into();
        let row = currencies::Model {
            id: tables.next_currency_id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            exchange_rate,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.currencies.insert(row.id, row.clone());
        row
    }

    /// Total ledger rows across all products.
    pub fn price_row_count(&self) -> usize {
        self.tables.lock().product_prices.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn create_product(&self, fields: NewProduct) -> Result<products::Model, StoreError> {
        let mut tables = self.tables.lock();
        tables.next_product_id += 1;
        let now = Utc::now().into();
        let row = products::Model {
            id: tables.next_product_id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            currency_id: fields.currency_id,
            tax_cost: fields.tax_cost,
            manufacturing_cost: fields.manufacturing_cost,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.products.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_product(&self, id: i32) -> Result<products::Model, StoreError> {
        self.tables
            .lock()
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", id)))
    }

    async fn get_product_detail(&self, id: i32) -> Result<ProductDetail, StoreError> {
        let tables = self.tables.lock();
        let product = tables
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", id)))?;
        let currency = tables.currencies.get(&product.currency_id).cloned();
        let mut prices: Vec<_> = tables
            .product_prices
            .values()
            .filter(|p| p.product_id == id)
            .map(|p| (p.clone(), tables.currencies.get(&p.currency_id).cloned()))
            .collect();
        prices.sort_by_key(|(p, _)| p.id);

        Ok(ProductDetail {
            product,
            currency,
            prices,
        })
    }

    async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<(products::Model, Option<currencies::Model>)>, u64), StoreError> {
        let tables = self.tables.lock();
        let total = tables.products.len() as u64;

        let mut all: Vec<_> = tables.products.values().cloned().collect();
        all.sort_by_key(|p| p.id);

        let page = page.max(1);
        let rows = all
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .map(|p| {
                let currency = tables.currencies.get(&p.currency_id).cloned();
                (p, currency)
            })
            .collect();

        Ok((rows, total))
    }

    async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<products::Model, StoreError> {
        let mut tables = self.tables.lock();
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", id)))?;

        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(currency_id) = changes.currency_id {
            product.currency_id = currency_id;
        }
        if let Some(tax_cost) = changes.tax_cost {
            product.tax_cost = tax_cost;
        }
        if let Some(manufacturing_cost) = changes.manufacturing_cost {
            product.manufacturing_cost = manufacturing_cost;
        }
        product.updated_at = Some(Utc::now().into());

        Ok(product.clone())
    }

    async fn delete_product(&self, id: i32) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if tables.products.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("Product {} not found", id)));
        }
        // Same cascade the schema's foreign key enforces in Postgres
        tables.product_prices.retain(|_, p| p.product_id != id);
        Ok(())
    }

    async fn list_prices(
        &self,
        product_id: i32,
    ) -> Result<Vec<(product_prices::Model, Option<currencies::Model>)>, StoreError> {
        let tables = self.tables.lock();
        let mut rows: Vec<_> = tables
            .product_prices
            .values()
            .filter(|p| p.product_id == product_id)
            .map(|p| (p.clone(), tables.currencies.get(&p.currency_id).cloned()))
            .collect();
        rows.sort_by_key(|(p, _)| p.id);
        Ok(rows)
    }

    async fn add_price(
        &self,
        product_id: i32,
        currency_id: i32,
        price: Decimal,
    ) -> Result<product_prices::Model, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::NotFound(format!("Product {} not found", product_id)));
        }

        tables.next_price_id += 1;
        let now = Utc::now().into();
        let row = product_prices::Model {
            id: tables.next_price_id,
            product_id,
            currency_id,
            price,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.product_prices.insert(row.id, row.clone());
        Ok(row)
    }

    async fn add_prices(
        &self,
        product_id: i32,
        rows: Vec<NewPrice>,
    ) -> Result<Vec<product_prices::Model>, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::NotFound(format!("Product {} not found", product_id)));
        }

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            tables.next_price_id += 1;
            let now = Utc::now().into();
            let model = product_prices::Model {
                id: tables.next_price_id,
                product_id,
                currency_id: row.currency_id,
                price: row.price,
                created_at: Some(now),
                updated_at: Some(now),
            };
            tables.product_prices.insert(model.id, model.clone());
            inserted.push(model);
        }

        Ok(inserted)
    }
}

#[async_trait]
impl CurrencyRegistry for InMemoryStore {
    async fn rate_of(&self, currency_id: i32) -> Result<Decimal, StoreError> {
        self.tables
            .lock()
            .currencies
            .get(&currency_id)
            .map(|c| c.exchange_rate)
            .ok_or_else(|| StoreError::NotFound(format!("Currency {} not found", currency_id)))
    }

    async fn list_all(&self) -> Result<Vec<currencies::Model>, StoreError> {
        let mut rows: Vec<_> = self.tables.lock().currencies.values().cloned().collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, fields: NewUser) -> Result<users::Model, StoreError> {
        let mut tables = self.tables.lock();
        tables.next_user_id += 1;
        let now = Utc::now().into();
        let row = users::Model {
            id: tables.next_user_id,
            name: fields.name,
            email: fields.email,
            password_hash: fields.password_hash,
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        let row = self
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned();
        Ok(row)
    }

    async fn find_user(&self, id: i32) -> Result<Option<users::Model>, StoreError> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }
}
