//! Request and response bodies exchanged between the services.

use common::{Cart, CustomerId};
use domain::{Customer, User};
use serde::{Deserialize, Serialize};
use store::Order;

/// Body of a buy request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyOrderRequest {
    pub cart: Cart,
    pub customer_id: Option<CustomerId>,
    /// Loyalty points to redeem against this order.
    pub redeem_points: i64,
    pub delivery_address: Option<String>,
}

/// Answer to a buy request on every path.
///
/// A non-empty `errors` list implies `order` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyOrderResponse {
    pub order: Option<Order>,
    pub message: String,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Body of a loyalty update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePointsRequest {
    pub customer_id: CustomerId,
    pub cart: Cart,
    #[serde(default)]
    pub redeem_points: i64,
}

/// Balance lookup answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsResponse {
    pub customer: Customer,
    /// Points required per currency unit of discount.
    pub redemption_rate: i64,
}

/// Successful login answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    pub message: String,
}
