//! Business logic for the retail services.
//!
//! This crate provides:
//! - The discount engine with its two rule strategies
//! - Pricing, loyalty and inventory services over the store repositories
//! - Bearer-token sessions and the ordered role scale
//! - The error taxonomy shared by every service

pub mod auth;
pub mod discount;
pub mod error;
pub mod inventory;
pub mod loyalty;
pub mod pricing;
pub mod seed;

pub use auth::{AuthService, Role, User, parse_bearer_token};
pub use discount::{AppliedDiscount, DiscountEngine, DiscountOutcome, DiscountRule};
pub use error::ServiceError;
pub use inventory::InventoryService;
pub use loyalty::{LoyaltyPolicy, LoyaltyService, LoyaltyUpdate};
pub use pricing::{PriceQuote, PricingService};
pub use store::{Catalog, Customer, InventoryStock, Order, OrderStatus, Product, StockSnapshot};
