//! Collaborator traits used by the orchestrator and their in-process implementations.
//!
//! Every call carries the caller's bearer token so remote implementations
//! can forward it; in-process implementations ignore it.

pub mod auth;
pub mod inventory;
pub mod loyalty;
pub mod pricing;

pub use auth::{AuthClient, LocalAuthClient};
pub use inventory::{InventoryClient, LocalInventoryClient};
pub use loyalty::{LocalLoyaltyClient, LoyaltyClient};
pub use pricing::{LocalPricingClient, PricingClient};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use domain::ServiceError;

/// Switch used by the in-process clients to simulate an unreachable collaborator.
#[derive(Debug, Clone, Default)]
pub(crate) struct Outage(Arc<AtomicBool>);

impl Outage {
    pub(crate) fn set(&self, down: bool) {
        self.0.store(down, Ordering::SeqCst);
    }

    pub(crate) fn check(&self, collaborator: &str) -> Result<(), ServiceError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(ServiceError::UpstreamUnavailable(format!(
                "unable to reach {collaborator} server"
            )));
        }
        Ok(())
    }
}
