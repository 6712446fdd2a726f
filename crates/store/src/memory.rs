use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{Cart, CustomerId, Money, OrderId, ProductId};
use tokio::sync::RwLock;

use crate::{
    Catalog, CatalogRepository, Customer, DecrementMode, InventoryRepository, InventoryStock,
    LedgerRepository, Order, OrderRepository, Product, Result, StockSnapshot, StoreError,
};

/// In-memory product catalog.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<Catalog>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with the given products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Adds or replaces a product.
    pub async fn upsert(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn all(&self) -> Result<Catalog> {
        Ok(self.products.read().await.clone())
    }

    async fn set_price(&self, id: &ProductId, price: Money) -> Result<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        product.price = price;
        Ok(product.clone())
    }
}

/// In-memory stock table.
#[derive(Clone, Default)]
pub struct InMemoryInventory {
    stock: Arc<RwLock<StockSnapshot>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory pre-populated with the given stock records.
    pub fn with_stock(stock: impl IntoIterator<Item = InventoryStock>) -> Self {
        let stock = stock
            .into_iter()
            .map(|s| (s.product_id.clone(), s))
            .collect();
        Self {
            stock: Arc::new(RwLock::new(stock)),
        }
    }

    /// Returns the quantity on hand for one product.
    pub async fn quantity(&self, id: &ProductId) -> Option<i64> {
        self.stock.read().await.get(id).map(|s| s.quantity)
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventory {
    async fn snapshot(&self) -> Result<StockSnapshot> {
        Ok(self.stock.read().await.clone())
    }

    async fn decrement(&self, cart: &Cart, mode: DecrementMode) -> Result<StockSnapshot> {
        let mut stock = self.stock.write().await;

        if mode == DecrementMode::Checked {
            for line in cart.lines() {
                if let Some(record) = stock.get(&line.product_id) {
                    let requested = i64::from(line.quantity);
                    if requested > record.quantity {
                        return Err(StoreError::InsufficientStock {
                            product_id: line.product_id.clone(),
                            requested,
                            available: record.quantity,
                        });
                    }
                }
            }
        }

        for line in cart.lines() {
            match stock.get_mut(&line.product_id) {
                Some(record) => record.quantity -= i64::from(line.quantity),
                None => {
                    tracing::debug!(product_id = %line.product_id, "skipping decrement of unknown product");
                }
            }
        }

        Ok(stock.clone())
    }
}

/// In-memory loyalty ledger.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger pre-populated with the given customers.
    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let customers = customers
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        Self {
            customers: Arc::new(RwLock::new(customers)),
        }
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn get(&self, id: &CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn compare_and_swap(&self, id: &CustomerId, expected: i64, new: i64) -> Result<Customer> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("customer", id))?;

        if customer.points != expected {
            return Err(StoreError::Conflict {
                kind: "customer",
                id: id.to_string(),
                expected,
                actual: customer.points,
            });
        }

        customer.points = new;
        Ok(customer.clone())
    }
}

/// In-memory order table.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<BTreeMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by_key(|o| o.timestamp);
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderStatus;
    use chrono::Utc;

    fn inventory() -> InMemoryInventory {
        InMemoryInventory::with_stock([
            InventoryStock::new("0001", 5, 2),
            InventoryStock::new("0002", 50, 20),
        ])
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(),
            buyer: "Alex Smith".to_string(),
            customer_id: CustomerId::new("000001"),
            delivery_address: None,
            status: OrderStatus::Processed,
            timestamp: Utc::now(),
            cart: Cart::from_pairs([("0001", 1)]),
            total: Money::from_cents(4550),
            discount: Money::zero(),
            discount_reasons: vec![],
        }
    }

    #[tokio::test]
    async fn test_set_price_is_visible_immediately() {
        let catalog = InMemoryCatalog::with_products([Product::new(
            "0001",
            "Gadget",
            Money::from_cents(4550),
        )]);
        let id = ProductId::new("0001");

        let updated = catalog.set_price(&id, Money::from_cents(3999)).await.unwrap();
        assert_eq!(updated.price.cents(), 3999);
        assert_eq!(catalog.get(&id).await.unwrap().unwrap().price.cents(), 3999);
    }

    #[tokio::test]
    async fn test_set_price_unknown_product() {
        let catalog = InMemoryCatalog::new();
        let result = catalog
            .set_price(&ProductId::new("0404"), Money::from_cents(1))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unchecked_decrement_skips_unknown_and_may_go_negative() {
        let inventory = inventory();
        let cart = Cart::from_pairs([("0001", 7), ("0404", 1)]);

        let snapshot = inventory
            .decrement(&cart, DecrementMode::Unchecked)
            .await
            .unwrap();

        assert_eq!(snapshot[&ProductId::new("0001")].quantity, -2);
        assert!(!snapshot.contains_key(&ProductId::new("0404")));
    }

    #[tokio::test]
    async fn test_checked_decrement_is_all_or_nothing() {
        let inventory = inventory();
        let cart = Cart::from_pairs([("0001", 6), ("0002", 10)]);

        let result = inventory.decrement(&cart, DecrementMode::Checked).await;
        assert!(matches!(result, Err(StoreError::InsufficientStock { .. })));

        assert_eq!(inventory.quantity(&ProductId::new("0001")).await, Some(5));
        assert_eq!(inventory.quantity(&ProductId::new("0002")).await, Some(50));
    }

    #[tokio::test]
    async fn test_checked_decrement_success() {
        let inventory = inventory();
        let cart = Cart::from_pairs([("0001", 5), ("0002", 10)]);

        inventory
            .decrement(&cart, DecrementMode::Checked)
            .await
            .unwrap();

        assert_eq!(inventory.quantity(&ProductId::new("0001")).await, Some(0));
        assert_eq!(inventory.quantity(&ProductId::new("0002")).await, Some(40));
    }

    #[tokio::test]
    async fn test_concurrent_checked_decrements_never_oversell() {
        let inventory = inventory();
        let mut handles = Vec::new();
        for _ in 0..10 {
            let inventory = inventory.clone();
            handles.push(tokio::spawn(async move {
                inventory
                    .decrement(&Cart::from_pairs([("0001", 1)]), DecrementMode::Checked)
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(inventory.quantity(&ProductId::new("0001")).await, Some(0));
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let ledger = InMemoryLedger::with_customers([Customer::new("000002", 1000)]);
        let id = CustomerId::new("000002");

        let updated = ledger.compare_and_swap(&id, 1000, 500).await.unwrap();
        assert_eq!(updated.points, 500);

        let stale = ledger.compare_and_swap(&id, 1000, 0).await;
        assert!(matches!(
            stale,
            Err(StoreError::Conflict {
                expected: 1000,
                actual: 500,
                ..
            })
        ));
        assert_eq!(ledger.get(&id).await.unwrap().unwrap().points, 500);
    }

    #[tokio::test]
    async fn test_compare_and_swap_unknown_customer() {
        let ledger = InMemoryLedger::new();
        let result = ledger
            .compare_and_swap(&CustomerId::new("999999"), 0, 10)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_order_insert_get_and_duplicate() {
        let repo = InMemoryOrderRepository::new();
        let order = order();

        repo.insert(&order).await.unwrap();
        assert_eq!(repo.get(order.id).await.unwrap(), Some(order.clone()));
        assert_eq!(repo.order_count().await, 1);

        let duplicate = repo.insert(&order).await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateOrder(_))));
        assert!(repo.get(OrderId::new()).await.unwrap().is_none());
    }
}
