//! HTTP handlers, one module per service.

pub mod auth;
pub mod health;
pub mod inventory;
pub mod loyalty;
pub mod metrics;
pub mod orders;
pub mod pricing;
