//! # Line Item Operations
//!
//! Adding, resizing and removing line items. Each operation moves stock
//! through the ledger and rewrites the order totals in one transaction.
//!
//! ## Stock Movement
//! ```text
//! add     qty q          → ledger.decrement(q)
//! update  old → new      → new > old: decrement(new - old)
//!                          new < old: increment(old - new)
//!                          new = old: nothing
//! remove  qty q          → ledger.increment(q)
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::ledger;
use crate::repository::order::{
    delete_line_item, fetch_line_item, generate_line_item_id, insert_line_item, save_order,
};
use crate::repository::product::fetch_product;
use crate::service::{begin_write, load_order, log_failure};
use backoffice_core::stock::check_reservation;
use backoffice_core::validation::validate_quantity;
use backoffice_core::{CoreError, LineItem, Order, Reservation};

#[derive(Debug, Clone)]
pub struct LineItemService {
    pool: SqlitePool,
    config: EngineConfig,
}

impl LineItemService {
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        LineItemService { pool, config }
    }

    /// Adds `quantity` units of a product to an order and reserves the stock.
    ///
    /// ## Errors
    /// - `OrderNotFound`, `ProductNotFound`
    /// - `OrderNotEditable` outside PENDING / ADDING_ITEMS
    /// - `ProductUnavailable`, `InsufficientStock`, `StockCritical`
    /// - `DuplicateLineItem` when the order already lists the product
    pub async fn add_line_item(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<LineItem> {
        self.add_line_item_tx(order_id, product_id, quantity)
            .await
            .inspect_err(|err| log_failure("add_line_item", err))
    }

    async fn add_line_item_tx(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<LineItem> {
        validate_quantity(quantity)?;

        let mut tx = begin_write(&self.pool).await?;

        let mut order = load_order(&mut tx, order_id).await?;
        order.ensure_line_items_editable("add line items")?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        check_reservation(&product, quantity, &Reservation::New, &self.config.stock_policy)?;
        order.ensure_product_not_listed(product_id)?;

        let stock_left = ledger::decrement(&mut tx, product_id, quantity).await?;

        let now = Utc::now();
        let item = LineItem::for_product(generate_line_item_id(), order_id, &product, quantity, now);
        insert_line_item(&mut tx, &item).await?;

        order.attach_line_item(item.clone(), self.config.tax_rate)?;
        order.updated_at = now;
        save_order(&mut tx, &order).await?;

        tx.commit().await?;

        info!(
            order_id,
            line_item_id = %item.id,
            product_id,
            quantity,
            stock_left,
            total_cents = order.total_cents,
            "Line item added"
        );
        Ok(item)
    }

    /// Changes a line item's quantity, reserving or releasing the difference.
    ///
    /// The line's current units count toward what is available, so growing
    /// from 3 to 8 with 5 in stock succeeds.
    pub async fn update_line_item_quantity(
        &self,
        line_item_id: &str,
        quantity: i64,
    ) -> EngineResult<LineItem> {
        self.update_line_item_quantity_tx(line_item_id, quantity)
            .await
            .inspect_err(|err| log_failure("update_line_item_quantity", err))
    }

    async fn update_line_item_quantity_tx(
        &self,
        line_item_id: &str,
        quantity: i64,
    ) -> EngineResult<LineItem> {
        validate_quantity(quantity)?;

        let mut tx = begin_write(&self.pool).await?;

        let current = fetch_line_item(&mut tx, line_item_id)
            .await?
            .ok_or_else(|| CoreError::LineItemNotFound(line_item_id.to_string()))?;
        let mut order = load_order(&mut tx, &current.order_id).await?;
        order.ensure_line_items_editable("update line items")?;

        let product = fetch_product(&mut tx, &current.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(current.product_id.clone()))?;
        let reservation = Reservation::Existing { held: current.quantity };
        check_reservation(&product, quantity, &reservation, &self.config.stock_policy)?;

        let delta = quantity - current.quantity;
        if delta > 0 {
            ledger::decrement(&mut tx, &product.id, delta).await?;
        } else if delta < 0 {
            ledger::increment(&mut tx, &product.id, -delta).await?;
        }

        let now = Utc::now();
        let previous =
            order.set_line_item_quantity(line_item_id, quantity, now, self.config.tax_rate)?;
        order.updated_at = now;
        save_order(&mut tx, &order).await?;

        let item = order.line_item(line_item_id)?.clone();
        tx.commit().await?;

        info!(
            order_id = %order.id,
            line_item_id,
            from = previous,
            to = quantity,
            total_cents = order.total_cents,
            "Line item quantity updated"
        );
        Ok(item)
    }

    /// Removes a line item and releases its stock. Returns the updated order.
    pub async fn remove_line_item(&self, line_item_id: &str) -> EngineResult<Order> {
        self.remove_line_item_tx(line_item_id)
            .await
            .inspect_err(|err| log_failure("remove_line_item", err))
    }

    async fn remove_line_item_tx(&self, line_item_id: &str) -> EngineResult<Order> {
        let mut tx = begin_write(&self.pool).await?;

        let item = fetch_line_item(&mut tx, line_item_id)
            .await?
            .ok_or_else(|| CoreError::LineItemNotFound(line_item_id.to_string()))?;
        let order = load_order(&mut tx, &item.order_id).await?;

        let order = self.detach(&mut tx, order, line_item_id).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Removes the line for `product_id` from an order.
    pub async fn remove_line_item_by_product(
        &self,
        order_id: &str,
        product_id: &str,
    ) -> EngineResult<Order> {
        self.remove_line_item_by_product_tx(order_id, product_id)
            .await
            .inspect_err(|err| log_failure("remove_line_item_by_product", err))
    }

    async fn remove_line_item_by_product_tx(
        &self,
        order_id: &str,
        product_id: &str,
    ) -> EngineResult<Order> {
        let mut tx = begin_write(&self.pool).await?;

        let order = load_order(&mut tx, order_id).await?;
        let line_item_id = order
            .line_item_for_product(product_id)
            .map(|item| item.id.clone())
            .ok_or_else(|| {
                CoreError::LineItemNotFound(format!("order {order_id}, product {product_id}"))
            })?;

        let order = self.detach(&mut tx, order, &line_item_id).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn detach(
        &self,
        conn: &mut SqliteConnection,
        mut order: Order,
        line_item_id: &str,
    ) -> EngineResult<Order> {
        let removed = order.detach_line_item(line_item_id, self.config.tax_rate)?;

        let stock = ledger::increment(conn, &removed.product_id, removed.quantity).await?;
        delete_line_item(conn, line_item_id).await?;

        order.updated_at = Utc::now();
        save_order(conn, &order).await?;

        info!(
            order_id = %order.id,
            line_item_id,
            product_id = %removed.product_id,
            released = removed.quantity,
            stock,
            total_cents = order.total_cents,
            "Line item removed"
        );
        Ok(order)
    }
}
