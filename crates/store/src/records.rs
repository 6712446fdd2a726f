//! Records held by the stores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{Cart, CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price, never negative.
    pub price: Money,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Stock level of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStock {
    pub product_id: ProductId,
    /// Units on hand. Only an unchecked decrement can drive this below zero.
    pub quantity: i64,
    /// Remaining quantity at or below which a sale is flagged.
    pub low_stock_threshold: i64,
}

impl InventoryStock {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64, low_stock_threshold: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            low_stock_threshold,
        }
    }
}

/// A loyalty customer and their point balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub points: i64,
}

impl Customer {
    pub fn new(id: impl Into<CustomerId>, points: i64) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }
}

/// Full catalog keyed by product id.
pub type Catalog = BTreeMap<ProductId, Product>;

/// Stock levels keyed by product id.
pub type StockSnapshot = BTreeMap<ProductId, InventoryStock>;

/// Lifecycle status of an order. Orders are only ever stored once processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Processed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processed => "processed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processed" => Some(OrderStatus::Processed),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fulfilled order. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Display name of the authenticated user who placed the order.
    pub buyer: String,
    pub customer_id: CustomerId,
    pub delivery_address: Option<String>,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub cart: Cart,
    /// Pre-discount total.
    pub total: Money,
    pub discount: Money,
    pub discount_reasons: Vec<String>,
}

impl Order {
    /// Amount due once all discounts are applied.
    pub fn amount_due(&self) -> Money {
        self.total - self.discount
    }
}
