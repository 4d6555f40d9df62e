//! Handlers for the per-product price ledger endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, warn};

use crate::AppState;
use crate::handlers::product::{map_pricing_error, money_field, validation_error};
use crate::models::product::{AddPriceRequest, ErrorResponse, ProductPriceResponse};

/// GET /api/products/{id}/prices
pub async fn list_product_prices(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ProductPriceResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let rows = state
        .pricing
        .get_product_prices(id)
        .await
        .map_err(map_pricing_error)?;

    let body = rows
        .into_iter()
        .map(|(price, currency)| ProductPriceResponse::from_price(price, currency))
        .collect();

    Ok(Json(body))
}

/// POST /api/products/{id}/prices
pub async fn add_product_price(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AddPriceRequest>,
) -> Result<(StatusCode, Json<ProductPriceResponse>), (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        product_id = id,
        currency_id = payload.currency_id,
        "Price addition request received"
    );

    validate_add_price(&payload)?;
    let price = money_field(payload.price, "price")?;

    let row = state
        .pricing
        .add_product_price(id, payload.currency_id, price)
        .await
        .map_err(|e| {
            warn!(correlation_id = %correlation_id, error = %e, "Price addition failed");
            map_pricing_error(e)
        })?;

    info!(
        correlation_id = %correlation_id,
        price_id = row.id,
        "Price added"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProductPriceResponse::from_price(row, None)),
    ))
}

fn validate_add_price(payload: &AddPriceRequest) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if payload.currency_id < 1 {
        return Err(validation_error(
            "currency_id must be a positive integer".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_currency_id_passes() {
        let payload = AddPriceRequest {
            currency_id: 3,
            price: 92.0,
        };
        assert!(validate_add_price(&payload).is_ok());
    }

    #[test]
    fn non_positive_currency_id_is_rejected() {
        let payload = AddPriceRequest {
            currency_id: 0,
            price: 92.0,
        };
        let (status, _) = validate_add_price(&payload).unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
