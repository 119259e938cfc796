//! # Order Aggregate
//!
//! `Order` is the aggregate root for its line items. Every line-item or
//! discount change goes through a method here, and each of those methods ends
//! by recomputing the totals, so stored totals never lag the line items.
//!
//! ## Ownership
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Order (root)                                 │
//! │   status, totals, notes                      │
//! │   items: Vec<LineItem> ◄── only mutated here │
//! │     ├── LineItem { product_id: A, qty 2 }    │
//! │     └── LineItem { product_id: B, qty 1 }    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Stock is not touched here. The storage layer reserves and releases stock
//! through the ledger in the same transaction that persists the aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::lifecycle::{validate_transition, OrderStatus};
use crate::money::Money;
use crate::totals::{compute_totals, percentage_discount, OrderTotals};
use crate::types::{NewOrder, Product, TaxRate};

// =============================================================================
// Line Item
// =============================================================================

/// One product line on an order.
///
/// The unit price and product name are snapshotted when the line is created
/// and do not follow later catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at the time the line was created.
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit price
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LineItem {
    /// Builds a line for `product`, snapshotting its price.
    pub fn for_product(
        id: String,
        order_id: &str,
        product: &Product,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Self {
        LineItem {
            id,
            order_id: order_id.to_string(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
            subtotal_cents: product.price().multiply_quantity(quantity).cents(),
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn recalculate_subtotal(&mut self) {
        self.subtotal_cents = self.unit_price().multiply_quantity(self.quantity).cents();
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,

    /// Human-readable number, e.g. `ORD-20250114-9F3A12BC`.
    pub order_number: String,

    pub customer_id: String,
    pub salesperson_id: String,
    pub status: OrderStatus,

    // Derived; written only by `recalculate_totals`.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Line items in insertion order. Loaded separately from the header row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Order {
    /// Opens a new PENDING order with zero totals.
    pub fn open(id: String, order_number: String, new: NewOrder, now: DateTime<Utc>) -> Self {
        Order {
            id,
            order_number,
            customer_id: new.customer_id,
            salesperson_id: new.salesperson_id,
            status: OrderStatus::Pending,
            subtotal_cents: 0,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            notes: new.notes,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Readings
    // -------------------------------------------------------------------------

    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Discount as a percentage of the subtotal; 0 when either is zero.
    pub fn discount_percentage(&self) -> f64 {
        if self.subtotal_cents <= 0 || self.discount_cents <= 0 {
            return 0.0;
        }
        self.discount_cents as f64 * 100.0 / self.subtotal_cents as f64
    }

    /// Subtotal minus discount, floored at zero.
    pub fn amount_after_discount(&self) -> Money {
        (self.subtotal() - self.discount()).floor_at_zero()
    }

    pub fn line_item(&self, line_item_id: &str) -> CoreResult<&LineItem> {
        self.items
            .iter()
            .find(|item| item.id == line_item_id)
            .ok_or_else(|| CoreError::LineItemNotFound(line_item_id.to_string()))
    }

    pub fn line_item_for_product(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    // -------------------------------------------------------------------------
    // Guards
    // -------------------------------------------------------------------------

    /// Fails with `OrderNotEditable` unless line items may change.
    pub fn ensure_line_items_editable(&self, operation: &str) -> CoreResult<()> {
        if self.status.allows_line_item_changes() {
            Ok(())
        } else {
            Err(CoreError::not_editable(&self.id, self.status, operation))
        }
    }

    pub fn ensure_discount_editable(&self, operation: &str) -> CoreResult<()> {
        if self.status.allows_discount_changes() {
            Ok(())
        } else {
            Err(CoreError::not_editable(&self.id, self.status, operation))
        }
    }

    pub fn ensure_deletable(&self) -> CoreResult<()> {
        if self.status.allows_deletion() {
            Ok(())
        } else {
            Err(CoreError::not_editable(&self.id, self.status, "delete order"))
        }
    }

    /// One line per product per order.
    pub fn ensure_product_not_listed(&self, product_id: &str) -> CoreResult<()> {
        match self.line_item_for_product(product_id) {
            Some(_) => Err(CoreError::DuplicateLineItem {
                order_id: self.id.clone(),
                product_id: product_id.to_string(),
            }),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Recomputes and stores the derived totals.
    pub fn recalculate_totals(&mut self, rate: TaxRate) -> OrderTotals {
        let discount = self.discount();
        let totals = compute_totals(&mut self.items, discount, rate);
        self.subtotal_cents = totals.subtotal.cents();
        self.discount_cents = totals.discount.cents();
        self.tax_cents = totals.tax.cents();
        self.total_cents = totals.total.cents();
        totals
    }

    /// Adds a line item and recomputes totals.
    pub fn attach_line_item(&mut self, item: LineItem, rate: TaxRate) -> CoreResult<()> {
        self.ensure_line_items_editable("add line items")?;
        self.ensure_product_not_listed(&item.product_id)?;
        self.items.push(item);
        self.recalculate_totals(rate);
        Ok(())
    }

    /// Changes a line's quantity and recomputes totals.
    ///
    /// Returns the quantity the line held before.
    pub fn set_line_item_quantity(
        &mut self,
        line_item_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
        rate: TaxRate,
    ) -> CoreResult<i64> {
        self.ensure_line_items_editable("update line items")?;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == line_item_id)
            .ok_or_else(|| CoreError::LineItemNotFound(line_item_id.to_string()))?;

        let previous = item.quantity;
        item.quantity = quantity;
        item.recalculate_subtotal();
        item.updated_at = now;

        self.recalculate_totals(rate);
        Ok(previous)
    }

    /// Removes a line item and recomputes totals. Returns the removed line.
    pub fn detach_line_item(&mut self, line_item_id: &str, rate: TaxRate) -> CoreResult<LineItem> {
        self.ensure_line_items_editable("remove line items")?;
        let index = self
            .items
            .iter()
            .position(|item| item.id == line_item_id)
            .ok_or_else(|| CoreError::LineItemNotFound(line_item_id.to_string()))?;

        let removed = self.items.remove(index);
        self.recalculate_totals(rate);
        Ok(removed)
    }

    /// Sets the discount to `percentage` of a freshly computed subtotal.
    pub fn apply_discount_percentage(&mut self, percentage: f64, rate: TaxRate) -> CoreResult<()> {
        self.ensure_discount_editable("apply a discount")?;
        let subtotal = self.recalculate_totals(rate).subtotal;
        self.discount_cents = percentage_discount(subtotal, percentage)?.cents();
        self.recalculate_totals(rate);
        Ok(())
    }

    pub fn remove_discount(&mut self, rate: TaxRate) -> CoreResult<()> {
        self.ensure_discount_editable("remove the discount")?;
        self.discount_cents = 0;
        self.recalculate_totals(rate);
        Ok(())
    }

    /// Moves one step forward in the lifecycle. Returns the previous status.
    pub fn transition_to(&mut self, target: OrderStatus) -> CoreResult<OrderStatus> {
        validate_transition(&self.id, self.status, target)?;
        let previous = self.status;
        self.status = target;
        Ok(previous)
    }

    pub fn update_notes(&mut self, notes: Option<String>) -> CoreResult<()> {
        if !self.status.allows_notes_update() {
            return Err(CoreError::not_editable(&self.id, self.status, "update notes"));
        }
        self.notes = notes;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
