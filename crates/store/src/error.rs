use common::{OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{kind} with id {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A compare-and-swap found a different value than expected.
    #[error("Concurrent update of {kind} {id}: expected {expected}, found {actual}")]
    Conflict {
        kind: &'static str,
        id: String,
        expected: i64,
        actual: i64,
    },

    /// An order with the same id is already stored.
    #[error("Order {0} already exists")]
    DuplicateOrder(OrderId),

    /// A checked decrement would take stock below zero.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
