//! HTTP services for the retail buy flow.
//!
//! One binary serves any of the five services (auth, inventory, price,
//! loyalty, order) or all of them at once, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{AuthService, InventoryService, LoyaltyService, PricingService, seed};
use fulfillment::{
    AuthClient, CallPolicy, HttpAuthClient, HttpInventoryClient, HttpLoyaltyClient,
    HttpPricingClient, InventoryClient, LocalAuthClient, LocalInventoryClient, LocalLoyaltyClient,
    LocalPricingClient, LoyaltyClient, OrderOrchestrator, PricingClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    DecrementMode, InMemoryLedger, InMemoryOrderRepository, OrderRepository,
    PostgresOrderRepository, StoreError,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{Config, ServiceKind};
use middleware::{Authenticator, authenticate, require_manager};
use routes::inventory::InventoryState;
use routes::loyalty::LoyaltyState;
use routes::orders::OrderState;
use routes::pricing::PricingState;

/// Orchestrator wired with type-erased collaborators, local or remote.
pub type Orchestrator = OrderOrchestrator<
    Arc<dyn AuthClient>,
    Arc<dyn InventoryClient>,
    Arc<dyn PricingClient>,
    Arc<dyn LoyaltyClient>,
    Arc<dyn OrderRepository>,
>;

/// The services' own state, seeded with demo data.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub inventory: InventoryState,
    pub pricing: PricingState,
    pub loyalty: Arc<LoyaltyService<InMemoryLedger>>,
}

impl Services {
    /// Builds every service over the seed catalog, stock, ledger and users.
    pub fn seeded(mode: DecrementMode) -> Self {
        Self {
            auth: seed::auth(),
            inventory: Arc::new(InventoryService::new(seed::inventory(), mode)),
            pricing: Arc::new(PricingService::new(seed::catalog(), seed::discount_engine())),
            loyalty: Arc::new(LoyaltyService::new(seed::ledger(), seed::loyalty_policy())),
        }
    }
}

/// Opens the order store: PostgreSQL when `DATABASE_URL` is set, in-memory otherwise.
pub async fn order_repository(config: &Config) -> Result<Arc<dyn OrderRepository>, StoreError> {
    match &config.database_url {
        Some(url) => {
            let repo = PostgresOrderRepository::connect(url).await?;
            repo.run_migrations().await?;
            tracing::info!("using PostgreSQL order store");
            Ok(Arc::new(repo))
        }
        None => Ok(Arc::new(InMemoryOrderRepository::new())),
    }
}

/// Collaborators as seen from one process.
struct Collaborators {
    auth: Arc<dyn AuthClient>,
    inventory: Arc<dyn InventoryClient>,
    pricing: Arc<dyn PricingClient>,
    loyalty: Arc<dyn LoyaltyClient>,
}

impl Collaborators {
    /// In-process collaborators over `services`.
    fn local(services: &Services) -> Self {
        let pricing: Arc<dyn PricingClient> =
            Arc::new(LocalPricingClient::new(services.pricing.clone()));
        Self {
            auth: Arc::new(LocalAuthClient::new(services.auth.clone())),
            inventory: Arc::new(LocalInventoryClient::new(services.inventory.clone())),
            loyalty: Arc::new(LocalLoyaltyClient::new(
                services.loyalty.clone(),
                pricing.clone(),
            )),
            pricing,
        }
    }

    /// Remote collaborators at the configured URLs.
    fn remote(config: &Config) -> Result<Self, reqwest::Error> {
        let client = fulfillment::http::client(config.upstream_timeout)?;
        Ok(Self {
            auth: Arc::new(HttpAuthClient::new(&config.auth_url, client.clone())),
            inventory: Arc::new(HttpInventoryClient::new(&config.inventory_url, client.clone())),
            pricing: Arc::new(HttpPricingClient::new(&config.price_url, client.clone())),
            loyalty: Arc::new(HttpLoyaltyClient::new(&config.loyalty_url, client)),
        })
    }
}

/// Routes of the auth service.
pub fn auth_router(auth: AuthService, authenticator: Authenticator) -> Router {
    let session = Router::new()
        .route("/info", get(routes::auth::info))
        .route_layer(axum::middleware::from_fn_with_state(authenticator, authenticate));

    Router::new()
        .route("/login", post(routes::auth::login))
        .with_state(auth)
        .merge(session)
}

/// Routes of the inventory service.
pub fn inventory_router(service: InventoryState, authenticator: Authenticator) -> Router {
    Router::new()
        .route("/", get(routes::inventory::stock))
        .route("/decrement", post(routes::inventory::decrement))
        .route_layer(axum::middleware::from_fn_with_state(authenticator, authenticate))
        .with_state(service)
}

/// Routes of the pricing service.
pub fn pricing_router(service: PricingState, authenticator: Authenticator) -> Router {
    let manager = Router::new()
        .route("/manager/set-price/{id}", put(routes::pricing::set_price))
        .route_layer(axum::middleware::from_fn(require_manager));

    Router::new()
        .route("/", get(routes::pricing::products))
        .route("/calculate", post(routes::pricing::calculate))
        .merge(manager)
        .route_layer(axum::middleware::from_fn_with_state(authenticator, authenticate))
        .with_state(service)
}

/// Routes of the loyalty service.
pub fn loyalty_router(state: LoyaltyState, authenticator: Authenticator) -> Router {
    Router::new()
        .route("/points/{customer_id}", get(routes::loyalty::points))
        .route("/update-points", post(routes::loyalty::update_points))
        .route_layer(axum::middleware::from_fn_with_state(authenticator, authenticate))
        .with_state(state)
}

/// Routes of the order service. The buy endpoint authenticates through the
/// orchestrator so that failures still produce the response envelope.
pub fn order_router(orchestrator: OrderState, authenticator: Authenticator) -> Router {
    let lookups = Router::new()
        .route("/orders/{id}", get(routes::orders::get))
        .route_layer(axum::middleware::from_fn_with_state(authenticator, authenticate));

    Router::new()
        .route("/new", post(routes::orders::buy))
        .merge(lookups)
        .with_state(orchestrator)
}

/// Builds the router for the configured service.
///
/// `Standalone` nests every service under its own prefix and wires the
/// orchestrator with in-process collaborators; any other kind serves one
/// service at the root and reaches its collaborators over HTTP.
pub fn build_services(
    config: &Config,
    services: Services,
    orders: Arc<dyn OrderRepository>,
) -> Result<Router, reqwest::Error> {
    let policy = CallPolicy::new(config.upstream_timeout, config.upstream_retries);

    let router = match config.service {
        ServiceKind::Standalone => {
            let local = Collaborators::local(&services);
            let authenticator = Authenticator::new(local.auth.clone(), policy);
            let orchestrator = Arc::new(
                OrderOrchestrator::new(
                    local.auth,
                    local.inventory,
                    local.pricing.clone(),
                    local.loyalty,
                    orders,
                )
                .with_policy(policy),
            );

            Router::new()
                .nest("/auth", auth_router(services.auth, authenticator.clone()))
                .nest(
                    "/inventory",
                    inventory_router(services.inventory, authenticator.clone()),
                )
                .nest("/price", pricing_router(services.pricing, authenticator.clone()))
                .nest(
                    "/loyalty",
                    loyalty_router(
                        LoyaltyState::new(services.loyalty, local.pricing),
                        authenticator.clone(),
                    ),
                )
                .nest("/order", order_router(orchestrator, authenticator))
        }
        ServiceKind::Auth => {
            let local: Arc<dyn AuthClient> = Arc::new(LocalAuthClient::new(services.auth.clone()));
            auth_router(services.auth, Authenticator::new(local, policy))
        }
        ServiceKind::Inventory => {
            let remote = Collaborators::remote(config)?;
            inventory_router(services.inventory, Authenticator::new(remote.auth, policy))
        }
        ServiceKind::Price => {
            let remote = Collaborators::remote(config)?;
            pricing_router(services.pricing, Authenticator::new(remote.auth, policy))
        }
        ServiceKind::Loyalty => {
            let remote = Collaborators::remote(config)?;
            loyalty_router(
                LoyaltyState::new(services.loyalty, remote.pricing),
                Authenticator::new(remote.auth, policy),
            )
        }
        ServiceKind::Order => {
            let remote = Collaborators::remote(config)?;
            let authenticator = Authenticator::new(remote.auth.clone(), policy);
            let orchestrator = Arc::new(
                OrderOrchestrator::new(
                    remote.auth,
                    remote.inventory,
                    remote.pricing,
                    remote.loyalty,
                    orders,
                )
                .with_policy(policy),
            );
            order_router(orchestrator, authenticator)
        }
    };

    tracing::info!(service = %config.service, "routes configured");
    Ok(router)
}

/// Wraps service routes with health, metrics, CORS and request tracing.
pub fn create_app(kind: ServiceKind, services: Router, metrics_handle: PrometheusHandle) -> Router {
    let health_router = Router::new()
        .route("/health", get(routes::health::check))
        .with_state(kind);

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    services
        .merge(health_router)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
