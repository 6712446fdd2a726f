use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Cart, CustomerId, Money, OrderId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Order, OrderRepository, OrderStatus, Result, StoreError};

/// PostgreSQL-backed order table.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new repository over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and returns a repository.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status).ok_or_else(|| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(format!(
                "unknown order status: {status}"
            ))))
        })?;
        let cart: Cart = serde_json::from_value(row.try_get("cart")?)?;
        let discount_reasons: Vec<String> =
            serde_json::from_value(row.try_get("discount_reasons")?)?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            buyer: row.try_get("buyer")?,
            customer_id: CustomerId::new(row.try_get::<String, _>("customer_id")?),
            delivery_address: row.try_get("delivery_address")?,
            status,
            timestamp: row.try_get::<DateTime<Utc>, _>("created_at")?,
            cart,
            total: Money::from_cents(row.try_get("total_cents")?),
            discount: Money::from_cents(row.try_get("discount_cents")?),
            discount_reasons,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        let cart = serde_json::to_value(&order.cart)?;
        let reasons = serde_json::to_value(&order.discount_reasons)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, buyer, customer_id, delivery_address, status, created_at, cart, total_cents, discount_cents, discount_reasons)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.buyer)
        .bind(order.customer_id.as_str())
        .bind(order.delivery_address.as_deref())
        .bind(order.status.as_str())
        .bind(order.timestamp)
        .bind(cart)
        .bind(order.total.cents())
        .bind(order.discount.cents())
        .bind(reasons)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::DuplicateOrder(order.id);
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, buyer, customer_id, delivery_address, status, created_at, cart, total_cents, discount_cents, discount_reasons
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, buyer, customer_id, delivery_address, status, created_at, cart, total_cents, discount_cents, discount_reasons
            FROM orders
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
