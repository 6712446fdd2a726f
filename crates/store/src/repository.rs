use std::sync::Arc;

use async_trait::async_trait;
use common::{Cart, CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::{Catalog, Customer, Order, Product, Result, StockSnapshot};

/// How a stock decrement treats lines that exceed the quantity on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecrementMode {
    /// Refuse the whole decrement if any known line would go below zero.
    #[default]
    Checked,
    /// Subtract every known line unconditionally; stock may go negative.
    Unchecked,
}

impl DecrementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecrementMode::Checked => "checked",
            DecrementMode::Unchecked => "unchecked",
        }
    }
}

/// Read access to products plus the single price mutation.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Returns one product, if it exists.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Returns a snapshot of the full catalog.
    async fn all(&self) -> Result<Catalog>;

    /// Replaces a product's price in place and returns the updated product.
    ///
    /// Fails with `NotFound` if the product is unknown.
    async fn set_price(&self, id: &ProductId, price: Money) -> Result<Product>;
}

/// Stock levels with an atomic multi-line decrement.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Returns a snapshot of all stock records.
    async fn snapshot(&self) -> Result<StockSnapshot>;

    /// Subtracts each cart line from its stock record and returns the updated snapshot.
    ///
    /// Lines for unknown products are skipped. The whole operation happens
    /// under one critical section; in `Checked` mode it is all-or-nothing.
    async fn decrement(&self, cart: &Cart, mode: DecrementMode) -> Result<StockSnapshot>;
}

/// Customer point balances.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Returns one customer, if present.
    async fn get(&self, id: &CustomerId) -> Result<Option<Customer>>;

    /// Sets the balance to `new` only if it currently equals `expected`.
    ///
    /// Fails with `Conflict` when the stored balance differs and with
    /// `NotFound` when the customer is unknown.
    async fn compare_and_swap(&self, id: &CustomerId, expected: i64, new: i64) -> Result<Customer>;
}

/// Persisted orders keyed by id.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order. Fails with `DuplicateOrder` if the id is taken.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Loads an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders, oldest first.
    async fn list(&self) -> Result<Vec<Order>>;
}

#[async_trait]
impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    async fn insert(&self, order: &Order) -> Result<()> {
        (**self).insert(order).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>> {
        (**self).list().await
    }
}
