//! Stock snapshot and decrement endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use common::Cart;
use domain::{InventoryService, StockSnapshot};
use store::InMemoryInventory;

use crate::error::ApiError;

pub type InventoryState = Arc<InventoryService<InMemoryInventory>>;

/// GET / — full stock snapshot.
pub async fn stock(State(service): State<InventoryState>) -> Result<Json<StockSnapshot>, ApiError> {
    Ok(Json(service.get_stock().await?))
}

/// POST /decrement — subtract a cart from stock using the configured mode.
pub async fn decrement(
    State(service): State<InventoryState>,
    body: Result<Json<Cart>, JsonRejection>,
) -> Result<Json<StockSnapshot>, ApiError> {
    let Json(cart) = body?;
    Ok(Json(service.decrement(&cart).await?))
}
