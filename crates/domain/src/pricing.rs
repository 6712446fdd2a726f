//! Cart pricing and catalog price management.

use common::{Cart, Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{Catalog, CatalogRepository, Product};

use crate::discount::DiscountEngine;
use crate::error::{Result, ServiceError};

/// Price of a cart. `total` is the pre-discount subtotal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub total: Money,
    pub discount: Money,
    pub discount_reasons: Vec<String>,
}

impl PriceQuote {
    /// Adds an extra discount with its reason after the rule-based ones.
    pub fn add_discount(&mut self, amount: Money, reason: impl Into<String>) {
        self.discount += amount;
        self.discount_reasons.push(reason.into());
    }
}

/// Prices carts against the catalog and applies the discount engine.
pub struct PricingService<C: CatalogRepository> {
    catalog: C,
    engine: DiscountEngine,
}

impl<C: CatalogRepository> PricingService<C> {
    pub fn new(catalog: C, engine: DiscountEngine) -> Self {
        Self { catalog, engine }
    }

    pub fn engine(&self) -> &DiscountEngine {
        &self.engine
    }

    /// Returns every product with its current price.
    pub async fn products(&self) -> Result<Catalog> {
        Ok(self.catalog.all().await?)
    }

    /// Prices a cart.
    ///
    /// Fails with `NotFound` if any line names a product missing from the
    /// catalog, and with `Validation` if the subtotal does not fit in
    /// [`Money`]; no partial quote is produced.
    #[tracing::instrument(skip(self, cart), fields(lines = cart.len()))]
    pub async fn price_cart(&self, cart: &Cart) -> Result<PriceQuote> {
        let catalog = self.catalog.all().await?;

        let mut total = Money::zero();
        for line in cart.lines() {
            let product = catalog
                .get(&line.product_id)
                .ok_or_else(|| ServiceError::not_found("product", &line.product_id))?;
            total = product
                .price
                .checked_multiply(u64::from(line.quantity))
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| {
                    ServiceError::Validation("cart total is too large to price".to_string())
                })?;
        }

        let discount = self.engine.evaluate(cart, &catalog);
        metrics::counter!("prices_calculated_total").increment(1);
        tracing::debug!(%total, discount = %discount.total, "cart priced");

        Ok(PriceQuote {
            total,
            discount: discount.total,
            discount_reasons: discount.reasons,
        })
    }

    /// Sets a product's unit price. Negative prices are rejected.
    #[tracing::instrument(skip(self))]
    pub async fn set_price(&self, product_id: &ProductId, price: Money) -> Result<Product> {
        if price.is_negative() {
            return Err(ServiceError::BusinessRule(format!(
                "price must not be negative, got {price}"
            )));
        }
        let product = self.catalog.set_price(product_id, price).await?;
        tracing::info!(%product_id, %price, "price updated");
        Ok(product)
    }
}
