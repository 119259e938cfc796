//! # Order Repository
//!
//! Database operations for order headers and their line items.
//!
//! ## Aggregate Persistence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fetch_order(conn, id)                                                  │
//! │     └── header row + line_items rows (insertion order) → Order          │
//! │                                                                         │
//! │  ... Order methods mutate items and recompute totals ...               │
//! │                                                                         │
//! │  insert_line_item / delete_line_item   structural change               │
//! │  save_order(conn, &order)              header + every line's qty/total │
//! │                                                                         │
//! │  All on the caller's transaction connection.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use backoffice_core::{LineItem, Order, OrderStatus};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, salesperson_id, status, \
     subtotal_cents, discount_cents, tax_cents, total_cents, notes, created_at, updated_at";

const LINE_ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, \
     unit_price_cents, subtotal_cents, created_at, updated_at";

/// Repository for order reads outside a transaction.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn list_by_status(&self, status: OrderStatus) -> DbResult<Vec<Order>> {
        self.list_where("status = ?1", status.as_str()).await
    }

    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        self.list_where("customer_id = ?1", customer_id).await
    }

    pub async fn list_by_salesperson(&self, salesperson_id: &str) -> DbResult<Vec<Order>> {
        self.list_where("salesperson_id = ?1", salesperson_id).await
    }

    /// Newest first, line items loaded.
    async fn list_where(&self, predicate: &str, value: &str) -> DbResult<Vec<Order>> {
        debug!(predicate, value, "Listing orders");

        let mut conn = self.pool.acquire().await?;
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {predicate} ORDER BY created_at DESC, rowid DESC"
        );
        let mut orders = sqlx::query_as::<_, Order>(&sql)
            .bind(value)
            .fetch_all(&mut *conn)
            .await?;

        for order in &mut orders {
            order.items = fetch_line_items(&mut conn, &order.id).await?;
        }

        Ok(orders)
    }

    /// Line items of an order, in insertion order.
    pub async fn line_items(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_line_items(&mut conn, order_id).await
    }

    pub async fn get_line_item(&self, id: &str) -> DbResult<Option<LineItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_line_item(&mut conn, id).await
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match order {
        Some(mut order) => {
            order.items = fetch_line_items(conn, id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

pub(crate) async fn fetch_line_items(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<LineItem>> {
    let sql = format!(
        "SELECT {LINE_ITEM_COLUMNS} FROM line_items WHERE order_id = ?1 ORDER BY created_at, rowid"
    );
    let items = sqlx::query_as::<_, LineItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

pub(crate) async fn fetch_line_item(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<LineItem>> {
    let sql = format!("SELECT {LINE_ITEM_COLUMNS} FROM line_items WHERE id = ?1");
    let item = sqlx::query_as::<_, LineItem>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(item)
}

pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_id, salesperson_id, status,
            subtotal_cents, discount_cents, tax_cents, total_cents,
            notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(&order.salesperson_id)
    .bind(order.status)
    .bind(order.subtotal_cents)
    .bind(order.discount_cents)
    .bind(order.tax_cents)
    .bind(order.total_cents)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes the header and every line item's quantity and subtotal.
pub(crate) async fn save_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, status = %order.status, total_cents = order.total_cents, "Saving order");

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = ?2,
            subtotal_cents = ?3,
            discount_cents = ?4,
            tax_cents = ?5,
            total_cents = ?6,
            notes = ?7,
            updated_at = ?8
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(order.status)
    .bind(order.subtotal_cents)
    .bind(order.discount_cents)
    .bind(order.tax_cents)
    .bind(order.total_cents)
    .bind(&order.notes)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", &order.id));
    }

    for item in &order.items {
        sqlx::query(
            "UPDATE line_items SET quantity = ?2, subtotal_cents = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&item.id)
        .bind(item.quantity)
        .bind(item.subtotal_cents)
        .bind(item.updated_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub(crate) async fn insert_line_item(conn: &mut SqliteConnection, item: &LineItem) -> DbResult<()> {
    debug!(id = %item.id, order_id = %item.order_id, product_id = %item.product_id, "Inserting line item");

    sqlx::query(
        r#"
        INSERT INTO line_items (
            id, order_id, product_id, product_name, quantity,
            unit_price_cents, subtotal_cents, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_line_item(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM line_items WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("LineItem", id));
    }

    Ok(())
}

/// Deletes the order row; line items go with it (ON DELETE CASCADE).
pub(crate) async fn delete_order(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", id));
    }

    Ok(())
}

// =============================================================================
// Identifiers
// =============================================================================

/// Generates a human-readable order number.
///
/// ## Format
/// `ORD-YYYYMMDD-XXXXXXXX`, the suffix being 8 upper-case hex characters
/// from a fresh UUID. Uniqueness is enforced by the `orders.order_number`
/// UNIQUE index.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();

    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn generate_line_item_id() -> String {
    Uuid::new_v4().to_string()
}
