//! Catalog pricing orchestration.
//!
//! Single entry point the HTTP layer uses for products and their price
//! ledgers. Cross-entity rules live here: product existence is checked
//! before ledger reads and writes, and bulk derivation walks the whole
//! currency registry through the conversion engine.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::entities::{currencies, product_prices, products};
use crate::services::conversion::{self, ConversionError};
use crate::store::{
    CurrencyRegistry, NewPrice, NewProduct, ProductChanges, ProductDetail, ProductStore, StoreError,
};

#[derive(Debug)]
pub enum PricingError {
    NotFound(String),
    /// A stored exchange rate was non-positive: corrupt data, not user error
    InvalidRate(String),
    Database(String),
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::NotFound(msg) => write!(f, "Not found: {}", msg),
            PricingError::InvalidRate(msg) => write!(f, "Invalid exchange rate: {}", msg),
            PricingError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for PricingError {}

impl From<StoreError> for PricingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => PricingError::NotFound(msg),
            StoreError::Database(msg) => PricingError::Database(msg),
        }
    }
}

impl From<ConversionError> for PricingError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::InvalidRate(msg) => PricingError::InvalidRate(msg),
        }
    }
}

#[derive(Clone)]
pub struct PricingService {
    products: Arc<dyn ProductStore>,
    currencies: Arc<dyn CurrencyRegistry>,
}

impl PricingService {
    pub fn new(products: Arc<dyn ProductStore>, currencies: Arc<dyn CurrencyRegistry>) -> Self {
        Self {
            products,
            currencies,
        }
    }

    pub async fn create_product(&self, fields: NewProduct) -> Result<products::Model, PricingError> {
        let product = self.products.create_product(fields).await?;
        Ok(product)
    }

    pub async fn get_product_detail(&self, id: i32) -> Result<ProductDetail, PricingError> {
        let detail = self.products.get_product_detail(id).await?;
        Ok(detail)
    }

    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<(products::Model, Option<currencies::Model>)>, u64), PricingError> {
        let listing = self.products.list_products(page, per_page).await?;
        Ok(listing)
    }

    pub async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<products::Model, PricingError> {
        let product = self.products.update_product(id, changes).await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), PricingError> {
        self.products.delete_product(id).await?;
        Ok(())
    }

    /// Ledger listing. The product must exist even when its ledger is
    /// empty, so a missing id surfaces as `NotFound` rather than `[]`.
    pub async fn get_product_prices(
        &self,
        product_id: i32,
    ) -> Result<Vec<(product_prices::Model, Option<currencies::Model>)>, PricingError> {
        self.products.get_product(product_id).await?;
        let prices = self.products.list_prices(product_id).await?;
        Ok(prices)
    }

    /// Records a caller-supplied price for one currency. The amount is
    /// authoritative for that currency; no conversion happens here.
    pub async fn add_product_price(
        &self,
        product_id: i32,
        currency_id: i32,
        price: Decimal,
    ) -> Result<product_prices::Model, PricingError> {
        self.products.get_product(product_id).await?;
        let row = self.products.add_price(product_id, currency_id, price).await?;
        Ok(row)
    }

    /// Seeds one ledger row per registry currency by converting the
    /// product's native price through the reference unit. The native
    /// currency gets a row too, carrying the rounded native price.
    ///
    /// All conversions are computed before anything is written, so a bad
    /// rate aborts the whole batch. Rows are appended unconditionally:
    /// running this twice doubles the ledger.
    pub async fn derive_all_prices(
        &self,
        product: &products::Model,
    ) -> Result<Vec<product_prices::Model>, PricingError> {
        let from_rate = self.currencies.rate_of(product.currency_id).await?;
        let registry = self.currencies.list_all().await?;

        let mut rows = Vec::with_capacity(registry.len());
        for currency in &registry {
            let amount = conversion::convert(product.price, from_rate, currency.exchange_rate)?;
            rows.push(NewPrice {
                currency_id: currency.id,
                price: amount,
            });
        }

        let inserted = self.products.add_prices(product.id, rows).await?;

        info!(
            product_id = product.id,
            rows = inserted.len(),
            "Derived price ledger"
        );

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    fn service_with_store() -> (PricingService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let service = PricingService::new(store.clone(), store.clone());
        (service, store)
    }

    fn widget(currency_id: i32, price: Decimal) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            price,
            currency_id,
            tax_cost: dec!(1.00),
            manufacturing_cost: dec!(2.00),
        }
    }

    #[tokio::test]
    async fn get_prices_for_missing_product_is_not_found() {
        let (service, _store) = service_with_store();

        let err = service.get_product_prices(99).await.unwrap_err();
        assert!(matches!(err, PricingError::NotFound(_)));
    }

    #[tokio::test]
    async fn add_price_to_missing_product_writes_nothing() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));

        let err = service
            .add_product_price(99, usd.id, dec!(10.00))
            .await
            .unwrap_err();

        assert!(matches!(err, PricingError::NotFound(_)));
        assert_eq!(store.price_row_count(), 0);
    }

    #[tokio::test]
    async fn empty_ledger_of_existing_product_is_ok() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));
        let product = service.create_product(widget(usd.id, dec!(5.00))).await.unwrap();

        let prices = service.get_product_prices(product.id).await.unwrap();
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn derivation_covers_every_registry_currency() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));
        store.add_currency("Euro", "€", dec!(0.92));
        store.add_currency("British Pound", "£", dec!(0.79));
        store.add_currency("Mexican Peso", "MX$", dec!(17.5));
        store.add_currency("Japanese Yen", "¥", dec!(150.0));

        let product = service
            .create_product(widget(usd.id, dec!(100.00)))
            .await
            .unwrap();
        let rows = service.derive_all_prices(&product).await.unwrap();

        assert_eq!(rows.len(), 5);
        let mut seen: Vec<i32> = rows.iter().map(|r| r.currency_id).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 5);

        let native = rows.iter().find(|r| r.currency_id == usd.id).unwrap();
        assert_eq!(native.price, dec!(100.00));
    }

    #[tokio::test]
    async fn derivation_rounds_the_native_row() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));

        let product = service
            .create_product(widget(usd.id, dec!(10.005)))
            .await
            .unwrap();
        let rows = service.derive_all_prices(&product).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, dec!(10.01));
    }

    #[tokio::test]
    async fn usd_product_derives_ninety_two_eur() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));
        let eur = store.add_currency("Euro", "€", dec!(0.92));

        let product = service
            .create_product(widget(usd.id, dec!(100.00)))
            .await
            .unwrap();
        let rows = service.derive_all_prices(&product).await.unwrap();

        let eur_row = rows.iter().find(|r| r.currency_id == eur.id).unwrap();
        assert_eq!(eur_row.price, dec!(92.00));

        // The store takes any currency id; only the schema's foreign key
        // would reject this one.
        let orphan = service
            .add_product_price(product.id, 999, dec!(5.00))
            .await
            .unwrap();
        assert_eq!(orphan.currency_id, 999);
    }

    #[tokio::test]
    async fn repeated_derivation_stacks_rows() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));
        store.add_currency("Euro", "€", dec!(0.92));

        let product = service
            .create_product(widget(usd.id, dec!(50.00)))
            .await
            .unwrap();
        service.derive_all_prices(&product).await.unwrap();
        service.derive_all_prices(&product).await.unwrap();

        let ledger = service.get_product_prices(product.id).await.unwrap();
        assert_eq!(ledger.len(), 4);
    }

    #[tokio::test]
    async fn corrupt_registry_rate_aborts_derivation() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));
        store.add_currency("Broken", "??", dec!(0.0));

        let product = service
            .create_product(widget(usd.id, dec!(10.00)))
            .await
            .unwrap();
        let err = service.derive_all_prices(&product).await.unwrap_err();

        assert!(matches!(err, PricingError::InvalidRate(_)));
        assert_eq!(store.price_row_count(), 0);
    }

    #[tokio::test]
    async fn deleting_a_product_drops_its_ledger() {
        let (service, store) = service_with_store();
        let usd = store.add_currency("US Dollar", "$", dec!(1.0));
        store.add_currency("Euro", "€", dec!(0.92));

        let product = service
            .create_product(widget(usd.id, dec!(30.00)))
            .await
            .unwrap();
        service.derive_all_prices(&product).await.unwrap();
        assert_eq!(store.price_row_count(), 2);

        service.delete_product(product.id).await.unwrap();

        assert_eq!(store.price_row_count(), 0);
        let err = service.get_product_prices(product.id).await.unwrap_err();
        assert!(matches!(err, PricingError::NotFound(_)));
    }
}
