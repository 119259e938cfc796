//! # Order Lifecycle
//!
//! The order status machine: which transitions are legal and which
//! mutations each status permits.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PENDING ──► ADDING_ITEMS ──► AVAILABLE_FOR_PAYMENT ──► PAID            │
//! │                                                          │              │
//! │                                        CLOSED ◄── DELIVERED             │
//! │                                                                         │
//! │  • exactly one step forward per change                                  │
//! │  • never backward                                                       │
//! │  • CLOSED is terminal                                                   │
//! │                                                                         │
//! │                     line items   discount   delete   notes              │
//! │  PENDING                ✓           ✓          ✓       ✓                │
//! │  ADDING_ITEMS           ✓           ✓                  ✓                │
//! │  AVAILABLE_FOR_PAYMENT              ✓                  ✓                │
//! │  PAID                                                  ✓                │
//! │  DELIVERED                                             ✓                │
//! │  CLOSED                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Lifecycle phase of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Freshly created.
    Pending,
    /// Salesperson is building the order.
    AddingItems,
    /// Line items are frozen; waiting for the customer to pay.
    AvailableForPayment,
    Paid,
    Delivered,
    /// Terminal.
    Closed,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::AddingItems,
        OrderStatus::AvailableForPayment,
        OrderStatus::Paid,
        OrderStatus::Delivered,
        OrderStatus::Closed,
    ];

    /// Position in the lifecycle (PENDING = 0).
    pub const fn position(&self) -> usize {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::AddingItems => 1,
            OrderStatus::AvailableForPayment => 2,
            OrderStatus::Paid => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Closed => 5,
        }
    }

    /// The single legal successor, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        OrderStatus::ALL.get(self.position() + 1).copied()
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed)
    }

    /// Line items may be added, re-quantified or removed.
    pub const fn allows_line_item_changes(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::AddingItems)
    }

    /// Discount may be applied or removed.
    pub const fn allows_discount_changes(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::AddingItems | OrderStatus::AvailableForPayment
        )
    }

    /// The order may be deleted outright.
    pub const fn allows_deletion(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Free-text notes may be edited.
    pub const fn allows_notes_update(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns the stored/serialized name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::AddingItems => "ADDING_ITEMS",
            OrderStatus::AvailableForPayment => "AVAILABLE_FOR_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Closed => "CLOSED",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that `from → to` is exactly one step forward.
///
/// ## Rejections
/// - `from` is CLOSED
/// - `to == from`
/// - `to` is behind `from`
/// - `to` is more than one step ahead (the error names the jump)
pub fn validate_transition(order_id: &str, from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
    if from.is_terminal() {
        return Err(CoreError::illegal_transition(
            order_id,
            format!("order is {from}; its status can no longer change"),
        ));
    }

    if to == from {
        return Err(CoreError::illegal_transition(
            order_id,
            format!("order is already {from}"),
        ));
    }

    if to.position() < from.position() {
        return Err(CoreError::illegal_transition(
            order_id,
            format!("cannot move status backward from {from} to {to}"),
        ));
    }

    if from.next() != Some(to) {
        let expected = from.next().map(|s| s.as_str()).unwrap_or("none");
        return Err(CoreError::illegal_transition(
            order_id,
            format!("cannot skip from {from} to {to} (next status is {expected})"),
        ));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_chain() {
        let mut status = OrderStatus::Pending;
        let mut visited = vec![status];
        while let Some(next) = status.next() {
            validate_transition("o-1", status, next).unwrap();
            status = next;
            visited.push(status);
        }
        assert_eq!(visited, OrderStatus::ALL.to_vec());
        assert!(status.is_terminal());
    }

    #[test]
    fn test_skip_is_rejected_with_named_jump() {
        let err = validate_transition("o-1", OrderStatus::Pending, OrderStatus::Delivered)
            .unwrap_err();
        match err {
            CoreError::IllegalTransition { reason, .. } => {
                assert!(reason.contains("cannot skip from PENDING to DELIVERED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_backward_is_rejected() {
        let err =
            validate_transition("o-1", OrderStatus::Delivered, OrderStatus::Paid).unwrap_err();
        assert!(err.to_string().contains("backward from DELIVERED to PAID"));
    }

    #[test]
    fn test_closed_is_terminal() {
        for target in OrderStatus::ALL {
            assert!(matches!(
                validate_transition("o-1", OrderStatus::Closed, target),
                Err(CoreError::IllegalTransition { .. })
            ));
        }
    }

    #[test]
    fn test_same_status_is_rejected() {
        assert!(validate_transition("o-1", OrderStatus::Paid, OrderStatus::Paid).is_err());
    }

    #[test]
    fn test_permissions_per_status() {
        use OrderStatus::*;

        let items: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.allows_line_item_changes())
            .copied()
            .collect();
        assert_eq!(items, vec![Pending, AddingItems]);

        let discount: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.allows_discount_changes())
            .copied()
            .collect();
        assert_eq!(discount, vec![Pending, AddingItems, AvailableForPayment]);

        assert!(Pending.allows_deletion());
        assert!(!AddingItems.allows_deletion());
        assert!(Delivered.allows_notes_update());
        assert!(!Closed.allows_notes_update());
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&OrderStatus::AvailableForPayment).unwrap();
        assert_eq!(json, "\"AVAILABLE_FOR_PAYMENT\"");
        let parsed: OrderStatus = serde_json::from_str("\"ADDING_ITEMS\"").unwrap();
        assert_eq!(parsed, OrderStatus::AddingItems);
    }
}
