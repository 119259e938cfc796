//! # Order Totals Engine
//!
//! Derives subtotal, discount, tax and total from an order's line items.
//!
//! ## Recomputation Steps
//! ```text
//! line items ──► subtotal = Σ line subtotals   (zero subtotals recomputed first)
//!                   │
//! discount ─────────┤ clamp to subtotal, only when subtotal > 0
//!                   ▼
//!            taxable = max(subtotal - discount, 0)
//!                   │
//!                   ▼
//!            tax   = taxable × rate  (half-up to the cent)
//!            total = max(taxable + tax, 0)
//! ```
//!
//! A discount on an order with no line items is left as-is so an intended
//! discount survives while the salesperson is still building the order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::order::LineItem;
use crate::types::TaxRate;
use crate::validation::validate_discount_percentage;

/// Result of one totals recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    /// Discount after clamping.
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    /// `subtotal - discount`, floored at zero.
    pub fn taxable_base(&self) -> Money {
        (self.subtotal - self.discount).floor_at_zero()
    }
}

/// Recomputes totals for a set of line items.
///
/// Line items whose stored subtotal is zero get it recomputed in place from
/// quantity × unit price before summing.
pub fn compute_totals(items: &mut [LineItem], discount: Money, rate: TaxRate) -> OrderTotals {
    let subtotal: Money = items
        .iter_mut()
        .map(|item| {
            if item.subtotal_cents == 0 {
                item.recalculate_subtotal();
            }
            item.subtotal()
        })
        .sum();

    let discount = if subtotal.is_positive() && discount > subtotal {
        subtotal
    } else {
        discount
    };

    let taxable = (subtotal - discount).floor_at_zero();
    let tax = taxable.calculate_tax(rate);
    let total = (taxable + tax).floor_at_zero();

    OrderTotals {
        subtotal,
        discount,
        tax,
        total,
    }
}

/// Discount amount for a percentage of `subtotal`.
///
/// The percentage is converted to basis points (10.0 → 1000 bps) and the
/// amount rounded half-up to the cent.
///
/// ```rust
/// use backoffice_core::money::Money;
/// use backoffice_core::totals::percentage_discount;
///
/// let discount = percentage_discount(Money::from_cents(10000), 10.0).unwrap();
/// assert_eq!(discount.cents(), 1000);
/// assert!(percentage_discount(Money::from_cents(10000), 150.0).is_err());
/// ```
pub fn percentage_discount(subtotal: Money, percentage: f64) -> CoreResult<Money> {
    validate_discount_percentage(percentage)?;
    let bps = (percentage * 100.0).round() as u32;
    Ok(subtotal.basis_points(bps))
}
