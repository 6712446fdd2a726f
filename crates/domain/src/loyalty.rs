//! Loyalty points: earning on purchases and redeeming as a discount.

use std::collections::HashMap;

use common::{Cart, CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{Catalog, Customer, LedgerRepository, StoreError};

use crate::error::{Result, ServiceError};

/// Attempts at a compare-and-swap on one balance before giving up.
const MAX_CAS_ATTEMPTS: usize = 3;

/// Conversion constants between money and points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyPolicy {
    /// Points earned per currency unit spent.
    pub earn_rate: f64,
    /// Points required per currency unit of discount.
    pub redemption_rate: i64,
    /// Per-product earning multipliers; products not listed earn at 1.0.
    pub multipliers: HashMap<ProductId, f64>,
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self {
            earn_rate: 1.0,
            redemption_rate: 100,
            multipliers: HashMap::new(),
        }
    }
}

impl LoyaltyPolicy {
    /// Returns the multiplier configured for a product.
    pub fn multiplier(&self, product_id: &ProductId) -> f64 {
        self.multipliers.get(product_id).copied().unwrap_or(1.0)
    }

    /// Points earned for a cart. Each line is floored before summing.
    ///
    /// Lines whose product is missing from `prices` earn nothing.
    pub fn earned_points(&self, cart: &Cart, prices: &Catalog) -> i64 {
        cart.lines()
            .filter_map(|line| {
                let product = prices.get(&line.product_id)?;
                let points = f64::from(line.quantity)
                    * self.multiplier(&line.product_id)
                    * self.earn_rate
                    * product.price.cents() as f64
                    / 100.0;
                Some(points.floor() as i64)
            })
            .fold(0i64, i64::saturating_add)
    }

    /// Discount value of redeeming `points`.
    pub fn redemption_value(&self, points: i64) -> Money {
        Money::from_cents(points * 100 / self.redemption_rate)
    }
}

/// Result of settling one request against a customer's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyUpdate {
    pub customer_id: CustomerId,
    pub points_before: i64,
    pub points_after: i64,
    pub points_earned: i64,
    pub points_redeemed: i64,
    pub redemption_value: Money,
}

/// Earns and redeems points against the ledger.
pub struct LoyaltyService<L: LedgerRepository> {
    ledger: L,
    policy: LoyaltyPolicy,
}

impl<L: LedgerRepository> LoyaltyService<L> {
    pub fn new(ledger: L, policy: LoyaltyPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn policy(&self) -> &LoyaltyPolicy {
        &self.policy
    }

    /// Loads a customer or fails with `NotFound`.
    pub async fn customer(&self, customer_id: &CustomerId) -> Result<Customer> {
        self.ledger
            .get(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", customer_id))
    }

    /// Points a cart would earn at the given prices.
    pub fn compute_earned_points(&self, cart: &Cart, prices: &Catalog) -> i64 {
        self.policy.earned_points(cart, prices)
    }

    /// Redeems points without earning any and returns their discount value.
    #[tracing::instrument(skip(self))]
    pub async fn redeem_points(&self, customer_id: &CustomerId, requested: i64) -> Result<Money> {
        let update = self.settle(customer_id, 0, requested).await?;
        Ok(update.redemption_value)
    }

    /// Credits the points earned by `cart` and debits `redeem` points in one update.
    ///
    /// The redemption is checked against the balance held before this
    /// purchase; on failure the balance is left untouched.
    #[tracing::instrument(skip(self, cart, prices), fields(lines = cart.len()))]
    pub async fn update_points(
        &self,
        customer_id: &CustomerId,
        cart: &Cart,
        prices: &Catalog,
        redeem: i64,
    ) -> Result<LoyaltyUpdate> {
        let earned = self.compute_earned_points(cart, prices);
        self.settle(customer_id, earned, redeem).await
    }

    async fn settle(&self, customer_id: &CustomerId, earned: i64, redeem: i64) -> Result<LoyaltyUpdate> {
        if redeem < 0 {
            return Err(ServiceError::BusinessRule(format!(
                "cannot redeem a negative number of points: {redeem}"
            )));
        }

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let customer = self.customer(customer_id).await?;
            let before = customer.points;

            if redeem > before {
                return Err(ServiceError::BusinessRule(
                    "customer does not have enough points to fulfill request".to_string(),
                ));
            }

            let after = before
                .checked_add(earned)
                .and_then(|points| points.checked_sub(redeem))
                .ok_or_else(|| {
                    ServiceError::BusinessRule(format!(
                        "balance of customer {customer_id} would overflow"
                    ))
                })?;
            match self.ledger.compare_and_swap(customer_id, before, after).await {
                Ok(_) => {
                    metrics::counter!("loyalty_points_earned_total").increment(earned as u64);
                    metrics::counter!("loyalty_points_redeemed_total").increment(redeem as u64);
                    tracing::info!(%customer_id, before, after, earned, redeem, "points updated");
                    return Ok(LoyaltyUpdate {
                        customer_id: customer_id.clone(),
                        points_before: before,
                        points_after: after,
                        points_earned: earned,
                        points_redeemed: redeem,
                        redemption_value: self.policy.redemption_value(redeem),
                    });
                }
                Err(StoreError::Conflict { .. }) => {
                    tracing::debug!(%customer_id, attempt, "balance changed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::BusinessRule(format!(
            "balance of customer {customer_id} is being updated concurrently, try again"
        )))
    }
}
