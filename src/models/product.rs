//! Request and response shapes for the product endpoints.
//!
//! Money crosses the wire as plain JSON numbers; `Decimal` stays internal.
//! Timestamps serialize as RFC 3339 strings.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::entities::{currencies, product_prices, products};
use crate::store::ProductDetail;

/// Error body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency_id: i32,
    pub tax_cost: f64,
    pub manufacturing_cost: f64,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency_id: Option<i32>,
    pub tax_cost: Option<f64>,
    pub manufacturing_cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AddPriceRequest {
    pub currency_id: i32,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrencyResponse {
    pub id: i32,
    pub name: String,
    pub symbol: String,
}

impl CurrencyResponse {
    pub fn from_model(model: currencies::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            symbol: model.symbol,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductPriceResponse {
    pub id: i32,
    pub product_id: i32,
    pub currency_id: i32,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyResponse>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ProductPriceResponse {
    pub fn from_price(
        price: product_prices::Model,
        currency: Option<currencies::Model>,
    ) -> Self {
        Self {
            id: price.id,
            product_id: price.product_id,
            currency_id: price.currency_id,
            price: price.price.to_f64().unwrap_or(0.0),
            currency: currency.map(CurrencyResponse::from_model),
            created_at: price.created_at.map(|dt| dt.to_rfc3339()),
            updated_at: price.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency_id: i32,
    pub tax_cost: f64,
    pub manufacturing_cost: f64,
    /// Present when the native currency relation was loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyResponse>,
    /// Present only on the detail endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<ProductPriceResponse>>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ProductResponse {
    /// List/create shape: optional currency, no ledger.
    pub fn from_product(product: products::Model, currency: Option<currencies::Model>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price.to_f64().unwrap_or(0.0),
            currency_id: product.currency_id,
            tax_cost: product.tax_cost.to_f64().unwrap_or(0.0),
            manufacturing_cost: product.manufacturing_cost.to_f64().unwrap_or(0.0),
            currency: currency.map(CurrencyResponse::from_model),
            prices: None,
            created_at: product.created_at.map(|dt| dt.to_rfc3339()),
            updated_at: product.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }

    /// Detail shape: currency plus the full price ledger.
    pub fn from_detail(detail: ProductDetail) -> Self {
        let prices = detail
            .prices
            .into_iter()
            .map(|(price, currency)| ProductPriceResponse::from_price(price, currency))
            .collect();

        let mut response = Self::from_product(detail.product, detail.currency);
        response.prices = Some(prices);
        response
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub data: Vec<ProductResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}
