//! Storage layer for the retail services.
//!
//! Each service owns one store: the catalog (products and prices), the
//! inventory (stock levels), the loyalty ledger (customer point balances)
//! and the order table. Services only see the repository traits defined in
//! [`repository`]; the in-memory implementations guard their maps with a
//! per-store lock so mutations never lose updates under concurrent callers.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::{InMemoryCatalog, InMemoryInventory, InMemoryLedger, InMemoryOrderRepository};
pub use postgres::PostgresOrderRepository;
pub use records::{Catalog, Customer, InventoryStock, Order, OrderStatus, Product, StockSnapshot};
pub use repository::{
    CatalogRepository, DecrementMode, InventoryRepository, LedgerRepository, OrderRepository,
};
