//! Buy request orchestration.

use std::time::Instant;

use chrono::{SubsecRound, Utc};
use common::{Cart, CartLine, OrderId};
use domain::seed::DELIVERY_PRODUCT_ID;
use domain::{ServiceError, StockSnapshot};
use store::{Order, OrderRepository, OrderStatus};

use crate::clients::{AuthClient, InventoryClient, LoyaltyClient, PricingClient};
use crate::error::{AbortKind, OrderAborted};
use crate::policy::{CallPolicy, Idempotency};
use crate::state::BuyStage;
use crate::wire::{BuyOrderRequest, BuyOrderResponse, UpdatePointsRequest};

const SUCCESS_MESSAGE: &str = "order processed successfully";
const FAILURE_MESSAGE: &str = "unable to fulfill order";

/// Outcome of checking a cart against a stock snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockCheck {
    /// Lines that block the order.
    pub errors: Vec<String>,
    /// Lines that will leave stock at or below its low-stock threshold.
    pub warnings: Vec<String>,
}

impl StockCheck {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks every cart line against `stock`, collecting all problems.
///
/// Validation never stops at the first bad line.
pub fn validate_stock(cart: &Cart, stock: &StockSnapshot) -> StockCheck {
    let mut check = StockCheck::default();

    for line in cart.lines() {
        let id = &line.product_id;
        if line.quantity == 0 {
            check
                .errors
                .push(format!("quantity for product with ID: {id} must be greater than zero"));
            continue;
        }

        let Some(item) = stock.get(id) else {
            check.errors.push(format!("product with ID: {id} not found"));
            continue;
        };

        let requested = i64::from(line.quantity);
        if requested > item.quantity {
            check
                .errors
                .push(format!("insufficient stock to fulfill order for product with ID: {id}"));
        } else if item.quantity - requested <= item.low_stock_threshold {
            check.warnings.push(format!(
                "order will take stock for product with ID {id} below the warning threshold"
            ));
        }
    }

    check
}

/// Progress of one request through the stages.
struct Attempt {
    stage: BuyStage,
    warnings: Vec<String>,
    started: Instant,
}

impl Attempt {
    fn new() -> Self {
        Self {
            stage: BuyStage::Start,
            warnings: Vec::new(),
            started: Instant::now(),
        }
    }

    fn advance(&mut self, to: BuyStage) {
        debug_assert_eq!(self.stage.next(), Some(to));
        self.stage = to;
        tracing::info!(stage = %to, "buy stage reached");
    }

    fn abort(&self, kind: AbortKind, errors: Vec<String>) -> OrderAborted {
        let stage = self.stage;
        metrics::counter!("orders_aborted", "stage" => stage.as_str()).increment(1);
        metrics::histogram!("order_duration_seconds").record(self.started.elapsed().as_secs_f64());
        tracing::warn!(
            %stage,
            %kind,
            stock_committed = stage.stock_committed(),
            errors = ?errors,
            "order aborted"
        );

        OrderAborted {
            stage,
            kind,
            response: BuyOrderResponse {
                order: None,
                message: FAILURE_MESSAGE.to_string(),
                warnings: self.warnings.clone(),
                errors,
            },
        }
    }

    fn upstream(&self, collaborator: &str, error: ServiceError) -> OrderAborted {
        self.abort(
            AbortKind::UpstreamUnavailable,
            vec![format!("{collaborator} server was unable to fulfil order: {error}")],
        )
    }
}

/// Drives buy requests through authentication, stock, pricing, loyalty and
/// persistence.
///
/// The orchestrator holds no state of its own between requests. Stages run
/// strictly one after another; once stock is decremented it stays
/// decremented, whatever happens afterwards.
pub struct OrderOrchestrator<A, I, P, L, O>
where
    A: AuthClient,
    I: InventoryClient,
    P: PricingClient,
    L: LoyaltyClient,
    O: OrderRepository,
{
    auth: A,
    inventory: I,
    pricing: P,
    loyalty: L,
    orders: O,
    policy: CallPolicy,
}

impl<A, I, P, L, O> OrderOrchestrator<A, I, P, L, O>
where
    A: AuthClient,
    I: InventoryClient,
    P: PricingClient,
    L: LoyaltyClient,
    O: OrderRepository,
{
    /// Creates an orchestrator with the default call policy.
    pub fn new(auth: A, inventory: I, pricing: P, loyalty: L, orders: O) -> Self {
        Self {
            auth,
            inventory,
            pricing,
            loyalty,
            orders,
            policy: CallPolicy::default(),
        }
    }

    /// Replaces the timeout and retry policy for collaborator calls.
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &CallPolicy {
        &self.policy
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Runs one buy request to completion or abort.
    ///
    /// `token` is the caller's bearer token, already stripped of its scheme.
    #[tracing::instrument(skip(self, token, request), fields(lines = request.cart.len()))]
    pub async fn execute(
        &self,
        token: Option<&str>,
        request: BuyOrderRequest,
    ) -> Result<BuyOrderResponse, OrderAborted> {
        metrics::counter!("orders_total").increment(1);
        let mut attempt = Attempt::new();

        // Start -> Authenticated
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(attempt.abort(AbortKind::Auth, vec!["missing bearer token".to_string()]));
            }
        };
        let user = match self
            .policy
            .call("auth", Idempotency::Retryable, || self.auth.resolve(token))
            .await
        {
            Ok(user) => user,
            Err(e @ ServiceError::UpstreamUnavailable(_)) => return Err(attempt.upstream("auth", e)),
            Err(e) => return Err(attempt.abort(AbortKind::Auth, vec![e.to_string()])),
        };
        attempt.advance(BuyStage::Authenticated);

        let Some(customer_id) = request.customer_id.clone() else {
            return Err(attempt.abort(
                AbortKind::Validation,
                vec!["customer_id is required".to_string()],
            ));
        };
        if request.cart.is_empty() {
            return Err(attempt.abort(AbortKind::Validation, vec!["cart is empty".to_string()]));
        }
        if request.redeem_points < 0 {
            return Err(attempt.abort(
                AbortKind::Validation,
                vec!["redeem_points must not be negative".to_string()],
            ));
        }

        // Authenticated -> InventoryFetched
        let stock = self
            .policy
            .call("inventory", Idempotency::Retryable, || {
                self.inventory.stock(token)
            })
            .await
            .map_err(|e| attempt.upstream("inventory", e))?;
        attempt.advance(BuyStage::InventoryFetched);

        // InventoryFetched -> Validated
        let check = validate_stock(&request.cart, &stock);
        attempt.warnings = check.warnings;
        if !check.errors.is_empty() {
            return Err(attempt.abort(AbortKind::BusinessRule, check.errors));
        }
        attempt.advance(BuyStage::Validated);

        // Validated -> StockDecremented. A checked decrement refuses stock
        // taken by a concurrent order since the snapshot was read.
        self.policy
            .call("inventory", Idempotency::Once, || {
                self.inventory.decrement(token, &request.cart)
            })
            .await
            .map_err(|e| match e {
                ServiceError::BusinessRule(reason) => attempt.abort(
                    AbortKind::BusinessRule,
                    vec![format!("insufficient stock to fulfill order: {reason}")],
                ),
                e => attempt.upstream("inventory", e),
            })?;
        attempt.advance(BuyStage::StockDecremented);

        // StockDecremented -> Priced
        let delivery_address = request
            .delivery_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        let mut cart = request.cart.clone();
        if delivery_address.is_some() {
            cart.insert(CartLine::new(DELIVERY_PRODUCT_ID, 1));
        }
        let mut quote = self
            .policy
            .call("price", Idempotency::Retryable, || {
                self.pricing.quote(token, &cart)
            })
            .await
            .map_err(|e| attempt.upstream("price", e))?;
        attempt.advance(BuyStage::Priced);

        // Priced -> LoyaltyApplied (earning uses the cart without delivery)
        let points_request = UpdatePointsRequest {
            customer_id: customer_id.clone(),
            cart: request.cart.clone(),
            redeem_points: request.redeem_points,
        };
        let update = self
            .policy
            .call("loyalty", Idempotency::Once, || {
                self.loyalty.update_points(token, &points_request)
            })
            .await
            .map_err(|e| attempt.upstream("loyalty", e))?;
        if update.redemption_value.is_positive() {
            quote.add_discount(
                update.redemption_value,
                format!(
                    "{} off for using {} loyalty points",
                    update.redemption_value, update.points_redeemed
                ),
            );
        }
        attempt.advance(BuyStage::LoyaltyApplied);

        // LoyaltyApplied -> Persisted
        let order = Order {
            id: OrderId::new(),
            buyer: user.name,
            customer_id,
            delivery_address,
            status: OrderStatus::Processed,
            timestamp: Utc::now().trunc_subsecs(6),
            cart,
            total: quote.total,
            discount: quote.discount,
            discount_reasons: quote.discount_reasons,
        };
        if let Err(e) = self.orders.insert(&order).await {
            tracing::error!(order_id = %order.id, error = %e, "failed to store order");
            return Err(attempt.abort(
                AbortKind::Internal,
                vec![format!("unable to store order: {e}")],
            ));
        }
        attempt.advance(BuyStage::Persisted);

        let duration = attempt.started.elapsed().as_secs_f64();
        metrics::histogram!("order_duration_seconds").record(duration);
        metrics::counter!("orders_completed").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, discount = %order.discount, duration, "order processed");

        Ok(BuyOrderResponse {
            order: Some(order),
            message: SUCCESS_MESSAGE.to_string(),
            warnings: attempt.warnings,
            errors: Vec::new(),
        })
    }

    /// Loads a persisted order.
    pub async fn get_order(&self, id: OrderId) -> Result<Option<Order>, ServiceError> {
        Ok(self.orders.get(id).await?)
    }
}
