//! SeaORM-backed store implementation for Postgres.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::prelude::*;
use crate::entities::{currencies, product_prices, products, users};

use super::{
    CurrencyRegistry, NewPrice, NewProduct, NewUser, ProductChanges, ProductDetail, ProductStore,
    StoreError, UserStore,
};

/// Exchange rates change rarely; cached lookups keep derivation from
/// hammering the currencies table.
const RATE_CACHE_TTL_SECS: u64 = 600;
const RATE_CACHE_CAPACITY: u64 = 256;

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        StoreError::Database(err.to_string())
    }
}

pub struct PostgresStore {
    db: DatabaseConnection,
    rate_cache: Arc<Cache<i32, Decimal>>,
}

impl PostgresStore {
    pub fn new(db: DatabaseConnection) -> Self {
        let rate_cache = Cache::builder()
            .max_capacity(RATE_CACHE_CAPACITY)
            .time_to_live(Duration::from_secs(RATE_CACHE_TTL_SECS))
            .build();

        Self {
            db,
            rate_cache: Arc::new(rate_cache),
        }
    }

    async fn fetch_prices(
        &self,
        product_id: i32,
    ) -> Result<Vec<(product_prices::Model, Option<currencies::Model>)>, StoreError> {
        let rows = ProductPrices::find()
            .filter(product_prices::Column::ProductId.eq(product_id))
            .find_also_related(Currencies)
            .order_by_asc(product_prices::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows)
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn create_product(&self, fields: NewProduct) -> Result<products::Model, StoreError> {
        let row = products::ActiveModel {
            name: Set(fields.name),
            description: Set(fields.description),
            price: Set(fields.price),
            currency_id: Set(fields.currency_id),
            tax_cost: Set(fields.tax_cost),
            manufacturing_cost: Set(fields.manufacturing_cost),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(row)
    }

    async fn get_product(&self, id: i32) -> Result<products::Model, StoreError> {
        Products::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", id)))
    }

    async fn get_product_detail(&self, id: i32) -> Result<ProductDetail, StoreError> {
        let (product, currency) = Products::find_by_id(id)
            .find_also_related(Currencies)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", id)))?;

        let prices = self.fetch_prices(id).await?;

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
        let total = Products::find().count(&self.db).await?;

        let page = page.max(1);
        let rows = Products::find()
            .find_also_related(Currencies)
            .order_by_asc(products::Column::Id)
            .offset((page - 1) * per_page)
            .limit(per_page)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<products::Model, StoreError> {
        let product = Products::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", id)))?;

        let mut active: products::ActiveModel = product.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(currency_id) = changes.currency_id {
            active.currency_id = Set(currency_id);
        }
        if let Some(tax_cost) = changes.tax_cost {
            active.tax_cost = Set(tax_cost);
        }
        if let Some(manufacturing_cost) = changes.manufacturing_cost {
            active.manufacturing_cost = Set(manufacturing_cost);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = active.update(&self.db).await?;

        Ok(updated)
    }

    async fn delete_product(&self, id: i32) -> Result<(), StoreError> {
        let res = Products::delete_by_id(id).exec(&self.db).await?;

        if res.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("Product {} not found", id)));
        }

        Ok(())
    }

    async fn list_prices(
        &self,
        product_id: i32,
    ) -> Result<Vec<(product_prices::Model, Option<currencies::Model>)>, StoreError> {
        self.fetch_prices(product_id).await
    }

    async fn add_price(
        &self,
        product_id: i32,
        currency_id: i32,
        price: Decimal,
    ) -> Result<product_prices::Model, StoreError> {
        let txn = self.db.begin().await?;

        // SELECT ... FOR UPDATE on the owning product; concurrent ledger
        // writes for the same product queue behind this row lock.
        Products::find_by_id(product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", product_id)))?;

        let row = product_prices::ActiveModel {
            product_id: Set(product_id),
            currency_id: Set(currency_id),
            price: Set(price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(row)
    }

    async fn add_prices(
        &self,
        product_id: i32,
        rows: Vec<NewPrice>,
    ) -> Result<Vec<product_prices::Model>, StoreError> {
        let txn = self.db.begin().await?;

        Products::find_by_id(product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Product {} not found", product_id)))?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let model = product_prices::ActiveModel {
                product_id: Set(product_id),
                currency_id: Set(row.currency_id),
                price: Set(row.price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted.push(model);
        }

        txn.commit().await?;

        Ok(inserted)
    }
}

#[async_trait]
impl CurrencyRegistry for PostgresStore {
    async fn rate_of(&self, currency_id: i32) -> Result<Decimal, StoreError> {
        if let Some(rate) = self.rate_cache.get(&currency_id).await {
            return Ok(rate);
        }

        let currency = Currencies::find_by_id(currency_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Currency {} not found", currency_id)))?;

        self.rate_cache
            .insert(currency_id, currency.exchange_rate)
            .await;

        Ok(currency.exchange_rate)
    }

    async fn list_all(&self) -> Result<Vec<currencies::Model>, StoreError> {
        let rows = Currencies::find()
            .order_by_asc(currencies::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, fields: NewUser) -> Result<users::Model, StoreError> {
        let row = users::ActiveModel {
            name: Set(fields.name),
            email: Set(fields.email),
            password_hash: Set(fields.password_hash),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        let row = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(row)
    }

    async fn find_user(&self, id: i32) -> Result<Option<users::Model>, StoreError> {
        let row = Users::find_by_id(id).one(&self.db).await?;

        Ok(row)
    }
}
