//! Inventory collaborator trait and in-process implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::Cart;
use domain::{InventoryService, ServiceError, StockSnapshot};
use store::InventoryRepository;

use super::Outage;

/// Stock reads and decrements.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Returns the full stock snapshot.
    async fn stock(&self, token: &str) -> Result<StockSnapshot, ServiceError>;

    /// Decrements stock for every cart line and returns the updated snapshot.
    async fn decrement(&self, token: &str, cart: &Cart) -> Result<StockSnapshot, ServiceError>;
}

#[async_trait]
impl<T: InventoryClient + ?Sized> InventoryClient for Arc<T> {
    async fn stock(&self, token: &str) -> Result<StockSnapshot, ServiceError> {
        (**self).stock(token).await
    }

    async fn decrement(&self, token: &str, cart: &Cart) -> Result<StockSnapshot, ServiceError> {
        (**self).decrement(token, cart).await
    }
}

/// Inventory client backed by an [`InventoryService`] in the same process.
pub struct LocalInventoryClient<R: InventoryRepository> {
    service: Arc<InventoryService<R>>,
    stock_outage: Outage,
    decrement_outage: Outage,
}

impl<R: InventoryRepository> Clone for LocalInventoryClient<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            stock_outage: self.stock_outage.clone(),
            decrement_outage: self.decrement_outage.clone(),
        }
    }
}

impl<R: InventoryRepository> LocalInventoryClient<R> {
    pub fn new(service: Arc<InventoryService<R>>) -> Self {
        Self {
            service,
            stock_outage: Outage::default(),
            decrement_outage: Outage::default(),
        }
    }

    /// Makes subsequent stock reads fail as if the service were unreachable.
    pub fn set_fail_on_stock(&self, fail: bool) {
        self.stock_outage.set(fail);
    }

    /// Makes subsequent decrements fail as if the service were unreachable.
    pub fn set_fail_on_decrement(&self, fail: bool) {
        self.decrement_outage.set(fail);
    }
}

#[async_trait]
impl<R: InventoryRepository + 'static> InventoryClient for LocalInventoryClient<R> {
    async fn stock(&self, _token: &str) -> Result<StockSnapshot, ServiceError> {
        self.stock_outage.check("inventory")?;
        self.service.get_stock().await
    }

    async fn decrement(&self, _token: &str, cart: &Cart) -> Result<StockSnapshot, ServiceError> {
        self.decrement_outage.check("inventory")?;
        self.service.decrement(cart).await
    }
}
