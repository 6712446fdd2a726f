//! Shared identifiers and value objects for the retail services.

pub mod cart;
pub mod money;
pub mod types;

pub use cart::{Cart, CartLine, MismatchedLine};
pub use money::Money;
pub use types::{CustomerId, OrderId, ProductId};
