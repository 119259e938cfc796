//! # Engine Services
//!
//! Each public method is one unit of work: it opens a transaction, loads
//! what it needs on that connection, applies the core rules, writes, and
//! commits. Any failure drops the transaction, which rolls everything back.
//!
//! Write units start with `BEGIN IMMEDIATE`. A deferred transaction that
//! reads first and writes later cannot upgrade its lock once another writer
//! has committed, and SQLite fails that upgrade without consulting the busy
//! timeout. Taking the write lock up front makes writers queue instead.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ line_items.add_line_item(order, product, qty)                        │
//! │                                                                      │
//! │   BEGIN IMMEDIATE                                                    │
//! │   ├─ fetch order + items      ── OrderNotFound                       │
//! │   ├─ status allows edits?     ── OrderNotEditable                    │
//! │   ├─ fetch product            ── ProductNotFound                     │
//! │   ├─ stock::check_reservation ── Unavailable/Insufficient/Critical   │
//! │   ├─ no line for product yet  ── DuplicateLineItem                   │
//! │   ├─ ledger::decrement        ── InsufficientStock (lost a race)     │
//! │   ├─ insert line, recompute totals, save order                       │
//! │   COMMIT                                                             │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`CatalogService`] - products (the ledger's owner)
//! - [`InventoryService`] - stock checks, bulk checks, critical report
//! - [`LineItemService`] - add / update / remove line items
//! - [`OrderService`] - order lifecycle, discounts, notes, deletion

pub mod catalog;
pub mod inventory;
pub mod line_items;
pub mod orders;

pub use catalog::CatalogService;
pub use inventory::InventoryService;
pub use line_items::LineItemService;
pub use orders::OrderService;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{error, warn};

use crate::error::{EngineError, EngineResult};
use crate::repository::order::fetch_order;
use backoffice_core::{CoreError, Order};

/// Logs a failed operation: business rejections at WARN, storage at ERROR.
pub(crate) fn log_failure(operation: &'static str, err: &EngineError) {
    match err {
        EngineError::Business(rule) => warn!(operation, error = %rule, "Request rejected"),
        EngineError::Storage(db) => error!(operation, error = %db, "Storage failure"),
    }
}

/// Loads an order with its line items, or fails with `OrderNotFound`.
pub(crate) async fn load_order(conn: &mut SqliteConnection, order_id: &str) -> EngineResult<Order> {
    fetch_order(conn, order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
}

/// Opens a transaction that holds the database write lock from the start.
pub(crate) async fn begin_write(pool: &SqlitePool) -> sqlx::Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await
}
