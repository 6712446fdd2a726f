//! Stock reads and decrements.

use common::Cart;
use store::{DecrementMode, InventoryRepository, StockSnapshot};

use crate::error::Result;

/// Exposes the stock table to the other services.
pub struct InventoryService<R: InventoryRepository> {
    repo: R,
    mode: DecrementMode,
}

impl<R: InventoryRepository> InventoryService<R> {
    /// Creates a service whose `decrement` uses `mode`.
    pub fn new(repo: R, mode: DecrementMode) -> Self {
        Self { repo, mode }
    }

    pub fn mode(&self) -> DecrementMode {
        self.mode
    }

    /// Returns a read-only snapshot of every stock record.
    pub async fn get_stock(&self) -> Result<StockSnapshot> {
        Ok(self.repo.snapshot().await?)
    }

    /// Decrements stock for every known cart line using the configured mode.
    pub async fn decrement(&self, cart: &Cart) -> Result<StockSnapshot> {
        self.decrement_with(cart, self.mode).await
    }

    /// Decrements stock with an explicit mode.
    ///
    /// `Unchecked` subtracts unconditionally and may leave negative stock;
    /// callers must have validated sufficiency first.
    #[tracing::instrument(skip(self, cart), fields(lines = cart.len(), mode = mode.as_str()))]
    pub async fn decrement_with(&self, cart: &Cart, mode: DecrementMode) -> Result<StockSnapshot> {
        let snapshot = self.repo.decrement(cart, mode).await?;
        metrics::counter!("stock_decrements_total").increment(1);
        if let Some(negative) = snapshot.values().find(|s| s.quantity < 0) {
            tracing::warn!(product_id = %negative.product_id, quantity = negative.quantity, "stock went negative");
        }
        Ok(snapshot)
    }
}
