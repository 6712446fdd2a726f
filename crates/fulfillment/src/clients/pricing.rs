//! Pricing collaborator trait and in-process implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::Cart;
use domain::{Catalog, PriceQuote, PricingService, ServiceError};
use store::CatalogRepository;

use super::Outage;

/// Cart quotes and catalog reads.
#[async_trait]
pub trait PricingClient: Send + Sync {
    /// Prices a cart.
    async fn quote(&self, token: &str, cart: &Cart) -> Result<PriceQuote, ServiceError>;

    /// Returns every product with its current price.
    async fn products(&self, token: &str) -> Result<Catalog, ServiceError>;
}

#[async_trait]
impl<T: PricingClient + ?Sized> PricingClient for Arc<T> {
    async fn quote(&self, token: &str, cart: &Cart) -> Result<PriceQuote, ServiceError> {
        (**self).quote(token, cart).await
    }

    async fn products(&self, token: &str) -> Result<Catalog, ServiceError> {
        (**self).products(token).await
    }
}

/// Pricing client backed by a [`PricingService`] in the same process.
pub struct LocalPricingClient<C: CatalogRepository> {
    service: Arc<PricingService<C>>,
    outage: Outage,
}

impl<C: CatalogRepository> Clone for LocalPricingClient<C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            outage: self.outage.clone(),
        }
    }
}

impl<C: CatalogRepository> LocalPricingClient<C> {
    pub fn new(service: Arc<PricingService<C>>) -> Self {
        Self {
            service,
            outage: Outage::default(),
        }
    }

    /// Makes subsequent calls fail as if the pricing service were unreachable.
    pub fn set_unavailable(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl<C: CatalogRepository + 'static> PricingClient for LocalPricingClient<C> {
    async fn quote(&self, _token: &str, cart: &Cart) -> Result<PriceQuote, ServiceError> {
        self.outage.check("price")?;
        self.service.price_cart(cart).await
    }

    async fn products(&self, _token: &str) -> Result<Catalog, ServiceError> {
        self.outage.check("price")?;
        self.service.products().await
    }
}
