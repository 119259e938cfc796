//! # Error Types
//!
//! Domain-specific error types for backoffice-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  backoffice-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations (typed, recoverable)   │
//! │  └── ValidationError  - Malformed input                                 │
//! │                                                                         │
//! │  backoffice-db errors (separate crate)                                  │
//! │  ├── DbError          - Storage failures (opaque to callers)            │
//! │  └── EngineError      - Business(CoreError) | Storage(DbError)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → API layer           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, product names, quantities)
//! 3. Errors are enum variants, never String
//! 4. Nothing in this crate swallows an error; callers decide what to do

use thiserror::Error;

use crate::lifecycle::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business errors raised by the order/inventory engine.
///
/// Every variant is an expected condition the caller can recover from.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// No order with this id.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// No product with this id.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// No line item with this id (or for this order/product pair).
    #[error("Line item not found: {0}")]
    LineItemNotFound(String),

    /// The order's status does not permit the requested change.
    ///
    /// ## When This Occurs
    /// - Adding/editing/removing line items outside PENDING or ADDING_ITEMS
    /// - Changing the discount after AVAILABLE_FOR_PAYMENT
    /// - Deleting an order that is not PENDING
    /// - Touching anything on a CLOSED order
    #[error("Order {order_id} is {status}, cannot {operation}")]
    OrderNotEditable {
        order_id: String,
        status: OrderStatus,
        operation: String,
    },

    /// Product is not ACTIVE.
    #[error("Product {product_name} is not available for sale (status: {status})")]
    ProductUnavailable {
        product_name: String,
        status: String,
    },

    /// Requested quantity exceeds headroom.
    ///
    /// ## User Workflow
    /// ```text
    /// Add line item (qty: 5)
    ///      │
    ///      ▼
    /// Headroom: stock 3 (+ nothing reserved)
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Laptop", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Exactly the critical amount of slack exists and the caller asked for more.
    ///
    /// `reserved` is set in update mode: the quantity the line item already holds.
    #[error("Critical stock for {product_name}: only {available} available{}", reserved_suffix(.reserved))]
    StockCritical {
        product_name: String,
        available: i64,
        reserved: Option<i64>,
    },

    /// The order already has a line item for this product.
    #[error("Order {order_id} already has a line item for product {product_id}")]
    DuplicateLineItem {
        order_id: String,
        product_id: String,
    },

    /// Discount percentage outside [0, 100].
    #[error("Discount percentage must be between 0 and 100, got {percentage}")]
    InvalidDiscount { percentage: f64 },

    /// Status change skips states, goes backward, or leaves CLOSED.
    #[error("Illegal status transition for order {order_id}: {reason}")]
    IllegalTransition { order_id: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn reserved_suffix(reserved: &Option<i64>) -> String {
    match reserved {
        Some(held) => format!(" ({held} already reserved by this line item)"),
        None => String::new(),
    }
}

impl CoreError {
    /// Creates an OrderNotEditable error.
    pub fn not_editable(
        order_id: impl Into<String>,
        status: OrderStatus,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::OrderNotEditable {
            order_id: order_id.into(),
            status,
            operation: operation.into(),
        }
    }

    /// Creates an IllegalTransition error.
    pub fn illegal_transition(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::IllegalTransition {
            order_id: order_id.into(),
            reason: reason.into(),
        }
    }

    /// True for the stock-classification failures the validation engine raises.
    pub fn is_stock_rejection(&self) -> bool {
        matches!(
            self,
            CoreError::InsufficientStock { .. }
                | CoreError::StockCritical { .. }
                | CoreError::ProductUnavailable { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business rule runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., a SKU with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A unique business key is already taken.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
