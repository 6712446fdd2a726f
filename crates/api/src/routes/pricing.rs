//! Catalog, cart pricing and manager price update endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Form, Json};
use common::{Cart, Money, ProductId};
use domain::{Catalog, PriceQuote, PricingService, Product, ServiceError};
use serde::Deserialize;
use store::InMemoryCatalog;

use crate::error::ApiError;

pub type PricingState = Arc<PricingService<InMemoryCatalog>>;

#[derive(Debug, Deserialize)]
pub struct SetPriceForm {
    pub price: Option<String>,
}

/// GET / — every product with its current price.
pub async fn products(State(service): State<PricingState>) -> Result<Json<Catalog>, ApiError> {
    Ok(Json(service.products().await?))
}

/// POST /calculate — price a cart.
pub async fn calculate(
    State(service): State<PricingState>,
    body: Result<Json<Cart>, JsonRejection>,
) -> Result<Json<PriceQuote>, ApiError> {
    let Json(cart) = body?;
    Ok(Json(service.price_cart(&cart).await?))
}

/// PUT /manager/set-price/{id} — replace a product's unit price.
#[tracing::instrument(skip(service, form))]
pub async fn set_price(
    State(service): State<PricingState>,
    Path(id): Path<String>,
    Form(form): Form<SetPriceForm>,
) -> Result<Json<Product>, ApiError> {
    let raw = form
        .price
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ServiceError::Validation("price field missing".to_string()))?;
    let price = parse_price(&raw)?;

    Ok(Json(service.set_price(&ProductId::new(id), price).await?))
}

fn parse_price(raw: &str) -> Result<Money, ServiceError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(Money::from_decimal)
        .ok_or_else(|| ServiceError::Validation(format!("price value must be a decimal number, got {raw}")))
}
