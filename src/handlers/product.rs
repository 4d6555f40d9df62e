//! Handlers for product CRUD endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{error, info};

use crate::AppState;
use crate::models::product::{
    CreateProductRequest, ErrorResponse, ListProductsQuery, MessageResponse, ProductListResponse,
    ProductResponse, UpdateProductRequest,
};
use crate::services::conversion::round_money;
use crate::services::pricing::PricingError;
use crate::store::{NewProduct, ProductChanges};

const DEFAULT_PER_PAGE: u64 = 15;
const MAX_PER_PAGE: u64 = 100;

/// GET /api/products?page=&per_page=
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ProductListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let (rows, total) = state
        .pricing
        .list_products(page, per_page)
        .await
        .map_err(map_pricing_error)?;

    let data = rows
        .into_iter()
        .map(|(product, currency)| ProductResponse::from_product(product, currency))
        .collect();

    Ok(Json(ProductListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        name = %payload.name,
        currency_id = payload.currency_id,
        "Product creation request received"
    );

    validate_create_product(&payload)?;

    let fields = NewProduct {
        name: payload.name.trim().to_string(),
        description: payload.description,
        price: money_field(payload.price, "price")?,
        currency_id: payload.currency_id,
        tax_cost: money_field(payload.tax_cost, "tax_cost")?,
        manufacturing_cost: money_field(payload.manufacturing_cost, "manufacturing_cost")?,
    };

    let product = state.pricing.create_product(fields).await.map_err(|e| {
        error!(correlation_id = %correlation_id, error = %e, "Product creation failed");
        map_pricing_error(e)
    })?;

    info!(
        correlation_id = %correlation_id,
        product_id = product.id,
        "Product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::from_product(product, None)),
    ))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, (StatusCode, Json<ErrorResponse>)> {
    let detail = state
        .pricing
        .get_product_detail(id)
        .await
        .map_err(map_pricing_error)?;

    Ok(Json(ProductResponse::from_detail(detail)))
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        product_id = id,
        "Product update request received"
    );

    validate_update_product(&payload)?;

    let mut changes = ProductChanges::default();
    if let Some(name) = payload.name {
        changes.name = Some(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        changes.description = Some(description);
    }
    if let Some(price) = payload.price {
        changes.price = Some(money_field(price, "price")?);
    }
    if let Some(currency_id) = payload.currency_id {
        changes.currency_id = Some(currency_id);
    }
    if let Some(tax_cost) = payload.tax_cost {
        changes.tax_cost = Some(money_field(tax_cost, "tax_cost")?);
    }
    if let Some(manufacturing_cost) = payload.manufacturing_cost {
        changes.manufacturing_cost = Some(money_field(manufacturing_cost, "manufacturing_cost")?);
    }

    let product = state
        .pricing
        .update_product(id, changes)
        .await
        .map_err(|e| {
            error!(correlation_id = %correlation_id, error = %e, "Product update failed");
            map_pricing_error(e)
        })?;

    info!(correlation_id = %correlation_id, product_id = id, "Product updated");

    Ok(Json(ProductResponse::from_product(product, None)))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .pricing
        .delete_product(id)
        .await
        .map_err(map_pricing_error)?;

    info!(product_id = id, "Product deleted");

    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}

pub(crate) fn map_pricing_error(err: PricingError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        PricingError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(ErrorResponse { error: msg })),
        PricingError::InvalidRate(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Exchange rate error: {}", msg),
            }),
        ),
        PricingError::Database(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Database error: {}", msg),
            }),
        ),
    }
}

/// Parses a wire money amount into a rounded `Decimal`, rejecting NaN,
/// infinities and negatives with a validation error.
pub(crate) fn money_field(
    value: f64,
    field: &str,
) -> Result<Decimal, (StatusCode, Json<ErrorResponse>)> {
    if !value.is_finite() || value < 0.0 {
        return Err(validation_error(format!(
            "{} must be a non-negative number",
            field
        )));
    }

    // from_f64 recovers the shortest decimal for the float, so a wire value
    // of 10.005 is the exact midpoint before rounding rather than the
    // binary approximation just below it.
    Decimal::from_f64(value)
        .map(round_money)
        .ok_or_else(|| validation_error(format!("{} is out of range", field)))
}

pub(crate) fn validation_error(msg: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorResponse { error: msg }))
}

fn validate_create_product(
    payload: &CreateProductRequest,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    validate_name(&payload.name)?;

    if payload.description.trim().is_empty() {
        return Err(validation_error("description is required".to_string()));
    }
    if payload.currency_id < 1 {
        return Err(validation_error(
            "currency_id must be a positive integer".to_string(),
        ));
    }

    Ok(())
}

fn validate_update_product(
    payload: &UpdateProductRequest,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(description) = &payload.description {
        if description.trim().is_empty() {
            return Err(validation_error("description must not be empty".to_string()));
        }
    }
    if let Some(currency_id) = payload.currency_id {
        if currency_id < 1 {
            return Err(validation_error(
                "currency_id must be a positive integer".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(validation_error("name is required".to_string()));
    }
    if trimmed.len() > 255 {
        return Err(validation_error(
            "name must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_payload() -> CreateProductRequest {
        CreateProductRequest {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            price: 10.0,
            currency_id: 1,
            tax_cost: 1.0,
            manufacturing_cost: 2.0,
        }
    }

    #[test]
    fn valid_create_payload_passes() {
        assert!(validate_create_product(&create_payload()).is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut payload = create_payload();
        payload.name = "  ".to_string();
        let (status, _) = validate_create_product(&payload).unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn blank_description_is_rejected() {
        let mut payload = create_payload();
        payload.description = String::new();
        assert!(validate_create_product(&payload).is_err());
    }

    #[test]
    fn non_positive_currency_id_is_rejected() {
        let mut payload = create_payload();
        payload.currency_id = 0;
        assert!(validate_create_product(&payload).is_err());
    }

    #[test]
    fn empty_update_payload_passes() {
        assert!(validate_update_product(&UpdateProductRequest::default()).is_ok());
    }

    #[test]
    fn update_with_blank_name_is_rejected() {
        let payload = UpdateProductRequest {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(validate_update_product(&payload).is_err());
    }

    #[test]
    fn money_field_rounds_to_cents() {
        assert_eq!(money_field(10.005, "price").unwrap(), dec!(10.01));
        assert_eq!(money_field(92.0, "price").unwrap(), dec!(92.00));
        assert_eq!(money_field(0.0, "price").unwrap(), dec!(0.00));
    }

    #[test]
    fn money_field_rejects_bad_numbers() {
        assert!(money_field(-0.01, "price").is_err());
        assert!(money_field(f64::NAN, "price").is_err());
        assert!(money_field(f64::INFINITY, "price").is_err());
    }

    #[test]
    fn not_found_maps_to_404() {
        let (status, body) = map_pricing_error(PricingError::NotFound("Product 5 not found".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Product 5 not found");
    }

    #[test]
    fn invalid_rate_maps_to_500() {
        let (status, body) =
            map_pricing_error(PricingError::InvalidRate("source rate must be positive".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.contains("Exchange rate error"));
    }
}
