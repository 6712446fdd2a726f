//! Buy and order lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use common::OrderId;
use fulfillment::{BuyOrderRequest, BuyOrderResponse};
use store::Order;

use crate::Orchestrator;
use crate::error::{ApiError, abort_status};
use crate::middleware::bearer_token;

pub type OrderState = Arc<Orchestrator>;

/// POST /new — run a buy request. Always answers with the response envelope.
pub async fn buy(
    State(orchestrator): State<OrderState>,
    headers: HeaderMap,
    body: Result<Json<BuyOrderRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let response = BuyOrderResponse {
                order: None,
                message: "unable to fulfill order".to_string(),
                warnings: Vec::new(),
                errors: vec![rejection.body_text()],
            };
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    match orchestrator.execute(bearer_token(&headers), request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(aborted) => (abort_status(aborted.kind), Json(aborted.response)).into_response(),
    }
}

/// GET /orders/{id} — load a persisted order.
pub async fn get(
    State(orchestrator): State<OrderState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = OrderId::parse(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    orchestrator
        .get_order(order_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))
}
