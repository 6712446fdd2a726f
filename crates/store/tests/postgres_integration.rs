//! PostgreSQL order repository integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, SubsecRound, Utc};
use common::{Cart, CustomerId, Money, OrderId};
use serial_test::serial;
use sqlx::PgPool;
use store::{Order, OrderRepository, OrderStatus, PostgresOrderRepository, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_orders_table.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh repository with its own pool and an empty table
async fn get_test_repo() -> PostgresOrderRepository {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresOrderRepository::new(pool)
}

fn sample_order(minutes_ago: i64) -> Order {
    Order {
        id: OrderId::new(),
        buyer: "Antero Duarte".to_string(),
        customer_id: CustomerId::new("000002"),
        delivery_address: Some("1 Main Street".to_string()),
        status: OrderStatus::Processed,
        // Postgres keeps microseconds; drop sub-micro precision so equality holds.
        timestamp: (Utc::now() - Duration::minutes(minutes_ago)).trunc_subsecs(6),
        cart: Cart::from_pairs([("0001", 1), ("9999", 1)]),
        total: Money::from_cents(5050),
        discount: Money::from_cents(910),
        discount_reasons: vec!["1 x 20.0% off Gadget".to_string()],
    }
}

#[tokio::test]
#[serial]
async fn insert_and_get_order() {
    let repo = get_test_repo().await;
    let order = sample_order(0);

    repo.insert(&order).await.unwrap();

    let loaded = repo.get(order.id).await.unwrap().unwrap();
    assert_eq!(loaded, order);
}

#[tokio::test]
#[serial]
async fn get_unknown_order_returns_none() {
    let repo = get_test_repo().await;
    assert!(repo.get(OrderId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn duplicate_insert_is_rejected() {
    let repo = get_test_repo().await;
    let order = sample_order(0);

    repo.insert(&order).await.unwrap();
    let result = repo.insert(&order).await;

    assert!(matches!(result, Err(StoreError::DuplicateOrder(id)) if id == order.id));
}

#[tokio::test]
#[serial]
async fn list_orders_oldest_first() {
    let repo = get_test_repo().await;
    let newer = sample_order(1);
    let older = sample_order(10);

    repo.insert(&newer).await.unwrap();
    repo.insert(&older).await.unwrap();

    let orders = repo.list().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, older.id);
    assert_eq!(orders[1].id, newer.id);
}

#[tokio::test]
#[serial]
async fn order_without_delivery_address_roundtrips() {
    let repo = get_test_repo().await;
    let mut order = sample_order(0);
    order.delivery_address = None;
    order.discount_reasons.clear();

    repo.insert(&order).await.unwrap();

    let loaded = repo.get(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.delivery_address, None);
    assert!(loaded.discount_reasons.is_empty());
}
