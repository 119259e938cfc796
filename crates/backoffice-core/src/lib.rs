//! # backoffice-core: Order–Inventory Rules
//!
//! Pure business logic for the back office order engine: the order
//! aggregate and its totals, the status machine, and the stock validation
//! rules. No I/O happens in this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Back Office Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            API layer (routing, auth, notifications)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │  backoffice-db: services, stock ledger, repositories (SQLite)   │   │
//! │  │  one transaction per operation                                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ backoffice-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  order   │ │ lifecycle│ │  stock   │ │  totals  │          │   │
//! │  │   │ aggregate│ │  status  │ │ headroom │ │ tax/disc │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   money · types · validation · error                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, TaxRate, creation/update parameters
//! - [`money`] - Money type with integer arithmetic
//! - [`order`] - Order aggregate and line items
//! - [`totals`] - Subtotal/discount/tax/total recomputation
//! - [`lifecycle`] - Order status machine
//! - [`stock`] - Stock validation engine and bulk reports
//! - [`validation`] - Input validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use backoffice_core::money::Money;
//! use backoffice_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(9000); // $90.00 after discount
//! let tax = subtotal.calculate_tax(TaxRate::default());
//! assert_eq!(tax.cents(), 180);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod order;
pub mod stock;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::OrderStatus;
pub use money::Money;
pub use order::{LineItem, Order};
pub use stock::{BulkValidationReport, Reservation, StockCheck, StockPolicy, StockValidation};
pub use totals::OrderTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sales tax applied to the taxable base: 200 bps = 2%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 200;

/// Stock at or below this many units is flagged for replenishment.
pub const CRITICAL_STOCK_THRESHOLD: i64 = 3;

/// Minimum headroom required to open a new line item.
pub const MIN_STOCK_FOR_CREATION: i64 = 1;

/// Minimum headroom required to edit an existing line item.
pub const MIN_STOCK_FOR_UPDATE: i64 = 1;

/// With exactly this much headroom, asking for more raises `StockCritical`
/// instead of `InsufficientStock`.
pub const CRITICAL_HEADROOM: i64 = 1;

/// Maximum quantity on a single line item.
///
/// Guards against typos such as 10000 instead of 10.
pub const MAX_LINE_ITEM_QUANTITY: i64 = 9999;

/// Maximum length of order notes, in characters.
pub const MAX_NOTES_LENGTH: usize = 1000;
