//! Demo data every service starts with.

use common::{Money, ProductId};
use store::{Customer, InMemoryCatalog, InMemoryInventory, InMemoryLedger, InventoryStock, Product};

use crate::auth::{AuthService, Role, User};
use crate::discount::{DiscountEngine, DiscountRule};
use crate::loyalty::LoyaltyPolicy;

/// Product id of the synthetic delivery line added to delivered orders.
pub const DELIVERY_PRODUCT_ID: &str = "9999";

/// Password of every demo account.
pub const DEMO_PASSWORD: &str = "supersafepassword";

pub fn products() -> Vec<Product> {
    vec![
        Product::new("0001", "Gadget", Money::from_cents(4550)),
        Product::new("0002", "Widget 1.0", Money::from_cents(545)),
        Product::new("0003", "Widget 2.0", Money::from_cents(745)),
        Product::new(DELIVERY_PRODUCT_ID, "Delivery", Money::from_cents(500)),
    ]
}

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_products(products())
}

pub fn discount_rules() -> Vec<DiscountRule> {
    vec![
        DiscountRule::PercentOff {
            product_id: ProductId::new("0001"),
            percent: 20.0,
        },
        DiscountRule::BundleXForY {
            product_ids: vec![ProductId::new("0002"), ProductId::new("0003")],
            x: 3,
            y: 2,
        },
    ]
}

pub fn discount_engine() -> DiscountEngine {
    DiscountEngine::new(discount_rules())
}

pub fn inventory() -> InMemoryInventory {
    InMemoryInventory::with_stock([
        InventoryStock::new("0001", 5, 2),
        InventoryStock::new("0002", 50, 20),
        InventoryStock::new("0003", 100, 20),
    ])
}

pub fn ledger() -> InMemoryLedger {
    InMemoryLedger::with_customers([Customer::new("000001", 0), Customer::new("000002", 1000)])
}

pub fn loyalty_policy() -> LoyaltyPolicy {
    LoyaltyPolicy {
        multipliers: [(ProductId::new("0001"), 2.0), (ProductId::new("0003"), 1.5)]
            .into_iter()
            .collect(),
        ..LoyaltyPolicy::default()
    }
}

pub fn auth() -> AuthService {
    AuthService::new([
        (
            User {
                username: "antero".to_string(),
                name: "Antero Duarte".to_string(),
                role: Role::Manager,
            },
            DEMO_PASSWORD.to_string(),
        ),
        (
            User {
                username: "alex".to_string(),
                name: "Alex Smith".to_string(),
                role: Role::User,
            },
            DEMO_PASSWORD.to_string(),
        ),
    ])
}
