//! Order fulfillment for the retail services.
//!
//! The [`OrderOrchestrator`] drives one buy request through a fixed
//! sequence of stages:
//! 1. Authenticate the bearer token
//! 2. Fetch the stock snapshot
//! 3. Validate every cart line against stock (errors and warnings are collected)
//! 4. Decrement stock
//! 5. Price the cart, including the delivery line when an address is given
//! 6. Earn and redeem loyalty points
//! 7. Persist the order
//!
//! A failure at any stage aborts the request. Nothing is compensated: stock
//! decremented in step 4 stays decremented if a later step fails.

pub mod clients;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod policy;
pub mod state;
pub mod wire;

pub use clients::{
    AuthClient, InventoryClient, LocalAuthClient, LocalInventoryClient, LocalLoyaltyClient,
    LocalPricingClient, LoyaltyClient, PricingClient,
};
pub use error::{AbortKind, OrderAborted};
pub use http::{HttpAuthClient, HttpInventoryClient, HttpLoyaltyClient, HttpPricingClient};
pub use orchestrator::{OrderOrchestrator, StockCheck, validate_stock};
pub use policy::{CallPolicy, Idempotency};
pub use state::BuyStage;
pub use wire::{BuyOrderRequest, BuyOrderResponse, LoginResponse, PointsResponse, UpdatePointsRequest};
