//! # Order Operations
//!
//! Order lifecycle, discounts, notes and deletion.
//!
//! ## Lifecycle
//! ```text
//! PENDING → ADDING_ITEMS → AVAILABLE_FOR_PAYMENT → PAID → DELIVERED → CLOSED
//!
//!                  line items   discount   delete   notes
//! PENDING             yes          yes       yes      yes
//! ADDING_ITEMS        yes          yes        -       yes
//! AVAILABLE_FOR_PAY    -           yes        -       yes
//! PAID / DELIVERED     -            -         -       yes
//! CLOSED               -            -         -        -
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger;
use crate::repository::order::{
    self as order_rows, generate_order_id, generate_order_number, insert_order, save_order,
    OrderRepository,
};
use crate::service::{begin_write, load_order, log_failure};
use backoffice_core::validation::{validate_notes, validate_reference};
use backoffice_core::{CoreError, CoreResult, LineItem, NewOrder, Order, OrderStatus, TaxRate};

#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
    config: EngineConfig,
}

impl OrderService {
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        OrderService { pool, config }
    }

    fn repository(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Creation and reads
    // -------------------------------------------------------------------------

    /// Opens a PENDING order with zero totals and a fresh order number.
    pub async fn create_order(&self, new: NewOrder) -> EngineResult<Order> {
        self.create_order_tx(new)
            .await
            .inspect_err(|err| log_failure("create_order", err))
    }

    async fn create_order_tx(&self, new: NewOrder) -> EngineResult<Order> {
        validate_reference("customer_id", &new.customer_id)?;
        validate_reference("salesperson_id", &new.salesperson_id)?;
        validate_notes(new.notes.as_deref())?;

        let now = Utc::now();
        let order = Order::open(generate_order_id(), generate_order_number(now), new, now);

        let mut tx = begin_write(&self.pool).await?;
        insert_order(&mut tx, &order).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            customer_id = %order.customer_id,
            "Order created"
        );
        Ok(order)
    }

    /// Order header with its line items.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        self.repository()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::OrderNotFound(order_id.to_string())))
    }

    pub async fn list_line_items(&self, order_id: &str) -> EngineResult<Vec<LineItem>> {
        let repo = self.repository();
        if !repo.exists(order_id).await? {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }
        Ok(repo.line_items(order_id).await?)
    }

    pub async fn get_line_item(&self, line_item_id: &str) -> EngineResult<LineItem> {
        self.repository()
            .get_line_item(line_item_id)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::LineItemNotFound(line_item_id.to_string())))
    }

    pub async fn list_orders_by_status(&self, status: OrderStatus) -> EngineResult<Vec<Order>> {
        Ok(self.repository().list_by_status(status).await?)
    }

    pub async fn list_orders_by_customer(&self, customer_id: &str) -> EngineResult<Vec<Order>> {
        Ok(self.repository().list_by_customer(customer_id).await?)
    }

    pub async fn list_orders_by_salesperson(
        &self,
        salesperson_id: &str,
    ) -> EngineResult<Vec<Order>> {
        Ok(self.repository().list_by_salesperson(salesperson_id).await?)
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    /// Moves the order exactly one step forward.
    ///
    /// Skipping, going backward, staying put and leaving CLOSED all fail with
    /// `IllegalTransition`.
    pub async fn change_status(&self, order_id: &str, target: OrderStatus) -> EngineResult<Order> {
        let mut previous = None;
        let order = self
            .mutate("change_status", order_id, |order, _| {
                previous = Some(order.transition_to(target)?);
                Ok(())
            })
            .await?;

        if let Some(from) = previous {
            info!(order_id, from = %from, to = %order.status, "Order status changed");
        }
        Ok(order)
    }

    pub async fn mark_as_adding_items(&self, order_id: &str) -> EngineResult<Order> {
        self.change_status(order_id, OrderStatus::AddingItems).await
    }

    pub async fn mark_as_available_for_payment(&self, order_id: &str) -> EngineResult<Order> {
        self.change_status(order_id, OrderStatus::AvailableForPayment)
            .await
    }

    pub async fn mark_as_paid(&self, order_id: &str) -> EngineResult<Order> {
        self.change_status(order_id, OrderStatus::Paid).await
    }

    pub async fn mark_as_delivered(&self, order_id: &str) -> EngineResult<Order> {
        self.change_status(order_id, OrderStatus::Delivered).await
    }

    pub async fn mark_as_closed(&self, order_id: &str) -> EngineResult<Order> {
        self.change_status(order_id, OrderStatus::Closed).await
    }

    // -------------------------------------------------------------------------
    // Discount and notes
    // -------------------------------------------------------------------------

    /// Sets the discount to `percentage` of the current subtotal.
    ///
    /// `percentage` must be within [0, 100]. Allowed up to
    /// AVAILABLE_FOR_PAYMENT.
    pub async fn apply_discount_percentage(
        &self,
        order_id: &str,
        percentage: f64,
    ) -> EngineResult<Order> {
        let order = self
            .mutate("apply_discount_percentage", order_id, |order, rate| {
                order.apply_discount_percentage(percentage, rate)
            })
            .await?;

        info!(
            order_id,
            percentage,
            discount_cents = order.discount_cents,
            total_cents = order.total_cents,
            "Discount applied"
        );
        Ok(order)
    }

    pub async fn remove_discount(&self, order_id: &str) -> EngineResult<Order> {
        let order = self
            .mutate("remove_discount", order_id, |order, rate| {
                order.remove_discount(rate)
            })
            .await?;

        info!(order_id, total_cents = order.total_cents, "Discount removed");
        Ok(order)
    }

    /// Replaces the notes. Rejected only on CLOSED orders.
    pub async fn update_notes(&self, order_id: &str, notes: Option<String>) -> EngineResult<Order> {
        validate_notes(notes.as_deref())
            .map_err(EngineError::from)
            .inspect_err(|err| log_failure("update_notes", err))?;

        let order = self
            .mutate("update_notes", order_id, |order, _| order.update_notes(notes))
            .await?;

        info!(order_id, "Order notes updated");
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------------

    /// Deletes a PENDING order, returning every reserved unit to stock.
    pub async fn delete_order(&self, order_id: &str) -> EngineResult<()> {
        self.delete_order_tx(order_id)
            .await
            .inspect_err(|err| log_failure("delete_order", err))
    }

    async fn delete_order_tx(&self, order_id: &str) -> EngineResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let order = load_order(&mut tx, order_id).await?;
        order.ensure_deletable()?;

        for item in &order.items {
            ledger::increment(&mut tx, &item.product_id, item.quantity).await?;
        }
        order_rows::delete_order(&mut tx, order_id).await?;

        tx.commit().await?;

        info!(
            order_id,
            order_number = %order.order_number,
            released_lines = order.items.len(),
            "Order deleted"
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Shared unit of work
    // -------------------------------------------------------------------------

    /// Loads the order, applies `change`, and saves it in one transaction.
    async fn mutate<F>(&self, operation: &'static str, order_id: &str, change: F) -> EngineResult<Order>
    where
        F: FnOnce(&mut Order, TaxRate) -> CoreResult<()>,
    {
        self.mutate_tx(order_id, change)
            .await
            .inspect_err(|err| log_failure(operation, err))
    }

    async fn mutate_tx<F>(&self, order_id: &str, change: F) -> EngineResult<Order>
    where
        F: FnOnce(&mut Order, TaxRate) -> CoreResult<()>,
    {
        let mut tx = begin_write(&self.pool).await?;

        let mut order = load_order(&mut tx, order_id).await?;
        change(&mut order, self.config.tax_rate)?;
        order.updated_at = Utc::now();
        save_order(&mut tx, &order).await?;

        tx.commit().await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use backoffice_core::NewProduct;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_order(customer: &str) -> NewOrder {
        NewOrder {
            customer_id: customer.to_string(),
            salesperson_id: "sp-1".to_string(),
            notes: Some("call before delivery".to_string()),
        }
    }

    async fn product(db: &Database, sku: &str, price_cents: i64, stock: i64) -> String {
        db.catalog()
            .create_product(NewProduct {
                sku: sku.to_string(),
                name: sku.to_string(),
                description: None,
                price_cents,
                stock,
                status: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_and_get_order() {
        let db = setup().await;
        let created = db.orders().create_order(new_order("cust-1")).await.unwrap();

        assert_eq!(created.status, OrderStatus::Pending);
        assert!(created.order_number.starts_with("ORD-"));

        let loaded = db.orders().get_order(&created.id).await.unwrap();
        assert_eq!(loaded.order_number, created.order_number);
        assert_eq!(loaded.total_cents, 0);
        assert_eq!(loaded.notes.as_deref(), Some("call before delivery"));
        assert!(db.orders().list_line_items(&created.id).await.unwrap().is_empty());

        assert!(matches!(
            db.orders().get_order("missing").await,
            Err(EngineError::Business(CoreError::OrderNotFound(_)))
        ));
        assert!(matches!(
            db.orders().list_line_items("missing").await,
            Err(EngineError::Business(CoreError::OrderNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_create_requires_references() {
        let db = setup().await;
        let mut bad = new_order("cust-1");
        bad.customer_id = "  ".to_string();

        assert!(matches!(
            db.orders().create_order(bad).await,
            Err(EngineError::Business(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_walk() {
        let db = setup().await;
        let orders = db.orders();
        let order = orders.create_order(new_order("cust-1")).await.unwrap();

        let err = orders.mark_as_paid(&order.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Business(CoreError::IllegalTransition { .. })));

        orders.mark_as_adding_items(&order.id).await.unwrap();
        orders.mark_as_available_for_payment(&order.id).await.unwrap();
        orders.mark_as_paid(&order.id).await.unwrap();

        assert!(orders
            .change_status(&order.id, OrderStatus::AddingItems)
            .await
            .is_err());

        orders.mark_as_delivered(&order.id).await.unwrap();
        let closed = orders.mark_as_closed(&order.id).await.unwrap();
        assert_eq!(closed.status, OrderStatus::Closed);

        assert!(orders.mark_as_closed(&order.id).await.is_err());
        assert!(orders.apply_discount_percentage(&order.id, 5.0).await.is_err());
        assert!(orders.update_notes(&order.id, None).await.is_err());
        assert!(orders.delete_order(&order.id).await.is_err());
        assert_eq!(
            orders.get_order(&order.id).await.unwrap().status,
            OrderStatus::Closed
        );
    }

    #[tokio::test]
    async fn test_discount_round_trip() {
        let db = setup().await;
        let pid = product(&db, "DSC-1", 5000, 10).await;
        let order = db.orders().create_order(new_order("cust-1")).await.unwrap();
        db.line_items().add_line_item(&order.id, &pid, 2).await.unwrap();

        let discounted = db
            .orders()
            .apply_discount_percentage(&order.id, 10.0)
            .await
            .unwrap();
        assert_eq!(discounted.discount_cents, 1000);
        assert_eq!(discounted.tax_cents, 180);
        assert_eq!(discounted.total_cents, 9180);

        assert!(matches!(
            db.orders().apply_discount_percentage(&order.id, 150.0).await,
            Err(EngineError::Business(CoreError::InvalidDiscount { .. }))
        ));
        assert_eq!(db.orders().get_order(&order.id).await.unwrap().total_cents, 9180);

        let cleared = db.orders().remove_discount(&order.id).await.unwrap();
        assert_eq!(cleared.discount_cents, 0);
        assert_eq!(cleared.total_cents, 10200);
    }

    #[tokio::test]
    async fn test_notes_allowed_until_closed() {
        let db = setup().await;
        let orders = db.orders();
        let order = orders.create_order(new_order("cust-1")).await.unwrap();
        orders.mark_as_adding_items(&order.id).await.unwrap();
        orders.mark_as_available_for_payment(&order.id).await.unwrap();
        orders.mark_as_paid(&order.id).await.unwrap();

        let updated = orders
            .update_notes(&order.id, Some("paid in cash".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("paid in cash"));
        assert_eq!(updated.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_delete_pending_order_releases_stock() {
        let db = setup().await;
        let a = product(&db, "DEL-1", 1000, 5).await;
        let b = product(&db, "DEL-2", 2000, 4).await;
        let order = db.orders().create_order(new_order("cust-1")).await.unwrap();
        db.line_items().add_line_item(&order.id, &a, 3).await.unwrap();
        db.line_items().add_line_item(&order.id, &b, 4).await.unwrap();

        db.orders().delete_order(&order.id).await.unwrap();

        assert_eq!(db.catalog().get_product(&a).await.unwrap().stock, 5);
        assert_eq!(db.catalog().get_product(&b).await.unwrap().stock, 4);
        assert!(matches!(
            db.orders().get_order(&order.id).await,
            Err(EngineError::Business(CoreError::OrderNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete_rejected_after_pending() {
        let db = setup().await;
        let a = product(&db, "DEL-3", 1000, 5).await;
        let order = db.orders().create_order(new_order("cust-1")).await.unwrap();
        db.line_items().add_line_item(&order.id, &a, 2).await.unwrap();
        db.orders().mark_as_adding_items(&order.id).await.unwrap();

        assert!(matches!(
            db.orders().delete_order(&order.id).await,
            Err(EngineError::Business(CoreError::OrderNotEditable { .. }))
        ));
        assert_eq!(db.catalog().get_product(&a).await.unwrap().stock, 3);
        assert_eq!(db.orders().get_order(&order.id).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_listings() {
        let db = setup().await;
        let orders = db.orders();
        let first = orders.create_order(new_order("cust-1")).await.unwrap();
        let second = orders.create_order(new_order("cust-1")).await.unwrap();
        orders.create_order(new_order("cust-2")).await.unwrap();
        orders.mark_as_adding_items(&second.id).await.unwrap();

        let by_customer = orders.list_orders_by_customer("cust-1").await.unwrap();
        assert_eq!(by_customer.len(), 2);

        let pending = orders
            .list_orders_by_status(OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().any(|o| o.id == first.id));

        let by_salesperson = orders.list_orders_by_salesperson("sp-1").await.unwrap();
        assert_eq!(by_salesperson.len(), 3);
    }
}
