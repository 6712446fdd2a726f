//! Discount rules and the engine that combines them.
//!
//! Rules are pure functions of `(cart, catalog)`. The engine evaluates them
//! in configuration order, sums every applicable amount and keeps the
//! reasons in the same order, so identical inputs always produce identical
//! quotes.

use common::{Cart, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use store::Catalog;

/// One applicable discount produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub amount: Money,
    pub reason: String,
}

/// Combined output of all rules for one cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountOutcome {
    pub total: Money,
    pub reasons: Vec<String>,
}

/// A configured discount strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountRule {
    /// `percent`% off every unit of one product.
    PercentOff { product_id: ProductId, percent: f64 },

    /// Buy `x` units from a product group, pay for `y`; the free units are
    /// valued at the cheapest product of the group.
    BundleXForY {
        product_ids: Vec<ProductId>,
        x: u32,
        y: u32,
    },
}

impl DiscountRule {
    /// Creates a percent-off rule. `percent` must lie in `0..=100`.
    pub fn percent_off(product_id: impl Into<ProductId>, percent: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ServiceError::Validation(format!(
                "percent must be between 0 and 100, got {percent}"
            )));
        }
        Ok(DiscountRule::PercentOff {
            product_id: product_id.into(),
            percent,
        })
    }

    /// Creates an X-for-Y bundle rule. Requires `x > y`.
    pub fn bundle<I, P>(product_ids: I, x: u32, y: u32) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<ProductId>,
    {
        if x <= y {
            return Err(ServiceError::Validation(format!(
                "bundle must give something away: {x} for {y}"
            )));
        }
        Ok(DiscountRule::BundleXForY {
            product_ids: product_ids.into_iter().map(Into::into).collect(),
            x,
            y,
        })
    }

    /// Evaluates the rule. `None` means the rule does not apply, or that its
    /// amount does not fit in [`Money`].
    pub fn evaluate(&self, cart: &Cart, catalog: &Catalog) -> Option<AppliedDiscount> {
        let applied = match self {
            DiscountRule::PercentOff {
                product_id,
                percent,
            } => {
                let line = cart.get(product_id)?;
                let product = catalog.get(product_id)?;
                AppliedDiscount {
                    amount: product
                        .price
                        .checked_multiply(u64::from(line.quantity))?
                        .percent(*percent),
                    reason: format!("{} x {}% off {}", line.quantity, percent, product.name),
                }
            }
            DiscountRule::BundleXForY { product_ids, x, y } => {
                let matched: u64 = cart
                    .lines()
                    .filter(|line| product_ids.contains(&line.product_id))
                    .map(|line| u64::from(line.quantity))
                    .sum();
                let bundles = matched / u64::from(*x);
                if bundles < 1 {
                    return None;
                }

                // First product at the minimum price wins.
                let mut cheapest: Option<Money> = None;
                for id in product_ids {
                    if let Some(product) = catalog.get(id)
                        && cheapest.is_none_or(|c| product.price < c)
                    {
                        cheapest = Some(product.price);
                    }
                }
                let cheapest = cheapest?;

                AppliedDiscount {
                    amount: cheapest.checked_multiply(bundles.checked_mul(u64::from(x - y))?)?,
                    reason: format!("{bundles} x buy {x} for the price of {y} on selected products"),
                }
            }
        };

        (applied.amount.is_positive() && !applied.reason.is_empty()).then_some(applied)
    }
}

/// Ordered list of rules applied to every quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountEngine {
    rules: Vec<DiscountRule>,
}

impl DiscountEngine {
    pub fn new(rules: Vec<DiscountRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[DiscountRule] {
        &self.rules
    }

    /// Evaluates every rule in order and combines the applicable ones.
    pub fn evaluate(&self, cart: &Cart, catalog: &Catalog) -> DiscountOutcome {
        let mut outcome = DiscountOutcome::default();
        for rule in &self.rules {
            if let Some(applied) = rule.evaluate(cart, catalog) {
                outcome.total = outcome.total.saturating_add(applied.amount);
                outcome.reasons.push(applied.reason);
            }
        }
        outcome
    }
}
