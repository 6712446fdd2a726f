//! Point balance and update endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::CustomerId;
use domain::{LoyaltyService, LoyaltyUpdate};
use fulfillment::{LocalLoyaltyClient, LoyaltyClient, PointsResponse, PricingClient, UpdatePointsRequest};
use store::InMemoryLedger;

use crate::error::ApiError;
use crate::middleware::bearer_token;

/// Ledger access plus the pricing collaborator used to value carts.
#[derive(Clone)]
pub struct LoyaltyState {
    pub service: Arc<LoyaltyService<InMemoryLedger>>,
    pub client: LocalLoyaltyClient<InMemoryLedger, Arc<dyn PricingClient>>,
}

impl LoyaltyState {
    pub fn new(service: Arc<LoyaltyService<InMemoryLedger>>, pricing: Arc<dyn PricingClient>) -> Self {
        let client = LocalLoyaltyClient::new(service.clone(), pricing);
        Self { service, client }
    }
}

/// GET /points/{customer_id} — balance and redemption rate.
pub async fn points(
    State(state): State<LoyaltyState>,
    Path(customer_id): Path<String>,
) -> Result<Json<PointsResponse>, ApiError> {
    let customer = state.service.customer(&CustomerId::new(customer_id)).await?;
    Ok(Json(PointsResponse {
        customer,
        redemption_rate: state.service.policy().redemption_rate,
    }))
}

/// POST /update-points — earn points for a cart and redeem in one update.
pub async fn update_points(
    State(state): State<LoyaltyState>,
    headers: HeaderMap,
    body: Result<Json<UpdatePointsRequest>, JsonRejection>,
) -> Result<Json<LoyaltyUpdate>, ApiError> {
    let Json(request) = body?;
    let token = bearer_token(&headers).unwrap_or_default();
    Ok(Json(state.client.update_points(token, &request).await?))
}
