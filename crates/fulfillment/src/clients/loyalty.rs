//! Loyalty collaborator trait and in-process implementation.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{LoyaltyService, LoyaltyUpdate, ServiceError};
use store::LedgerRepository;

use super::{Outage, PricingClient};
use crate::wire::UpdatePointsRequest;

/// Point earning and redemption.
#[async_trait]
pub trait LoyaltyClient: Send + Sync {
    /// Earns points for the cart and redeems `redeem_points` in one update.
    async fn update_points(
        &self,
        token: &str,
        request: &UpdatePointsRequest,
    ) -> Result<LoyaltyUpdate, ServiceError>;
}

#[async_trait]
impl<T: LoyaltyClient + ?Sized> LoyaltyClient for Arc<T> {
    async fn update_points(
        &self,
        token: &str,
        request: &UpdatePointsRequest,
    ) -> Result<LoyaltyUpdate, ServiceError> {
        (**self).update_points(token, request).await
    }
}

/// Loyalty client backed by a [`LoyaltyService`] in the same process.
///
/// Prices used for earning come from the pricing collaborator, as they do
/// for the standalone loyalty service.
pub struct LocalLoyaltyClient<L: LedgerRepository, P: PricingClient> {
    service: Arc<LoyaltyService<L>>,
    pricing: P,
    outage: Outage,
}

impl<L: LedgerRepository, P: PricingClient + Clone> Clone for LocalLoyaltyClient<L, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            pricing: self.pricing.clone(),
            outage: self.outage.clone(),
        }
    }
}

impl<L: LedgerRepository, P: PricingClient> LocalLoyaltyClient<L, P> {
    pub fn new(service: Arc<LoyaltyService<L>>, pricing: P) -> Self {
        Self {
            service,
            pricing,
            outage: Outage::default(),
        }
    }

    /// Makes subsequent calls fail as if the loyalty service were unreachable.
    pub fn set_unavailable(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl<L: LedgerRepository + 'static, P: PricingClient> LoyaltyClient for LocalLoyaltyClient<L, P> {
    async fn update_points(
        &self,
        token: &str,
        request: &UpdatePointsRequest,
    ) -> Result<LoyaltyUpdate, ServiceError> {
        self.outage.check("loyalty")?;
        let prices = self.pricing.products(token).await.map_err(|e| {
            ServiceError::UpstreamUnavailable(format!("unable to reach price server: {e}"))
        })?;
        self.service
            .update_points(
                &request.customer_id,
                &request.cart,
                &prices,
                request.redeem_points,
            )
            .await
    }
}
