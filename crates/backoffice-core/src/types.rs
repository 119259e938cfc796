//! # Domain Types
//!
//! Catalog types and the small value types shared across the engine.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  ProductStatus  │   │    TaxRate      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  Active         │   │  bps (u32)      │       │
//! │  │  sku (business) │   │  Inactive       │   │  200 = 2%       │       │
//! │  │  price_cents    │   │  Discontinued   │   └─────────────────┘       │
//! │  │  stock          │   │  OutOfStock     │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  Order / LineItem live in `order`, OrderStatus in `lifecycle`.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Ownership
//! `Product::stock` is only ever changed by the stock ledger in backoffice-db
//! (decrement to reserve, increment to release or restock). Nothing in this
//! crate assigns it after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 200 bps = 2%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Product Status
// =============================================================================

/// Availability of a product for new reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Can be added to orders.
    Active,
    /// Temporarily hidden from sale.
    Inactive,
    /// Permanently withdrawn.
    Discontinued,
    /// Set automatically when a product is created or updated with zero stock.
    OutOfStock,
}

impl ProductStatus {
    /// Returns the stored/serialized name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Inactive => "INACTIVE",
            ProductStatus::Discontinued => "DISCONTINUED",
            ProductStatus::OutOfStock => "OUT_OF_STOCK",
        }
    }

    /// Status after a manual toggle: ACTIVE becomes INACTIVE, anything else ACTIVE.
    pub const fn toggled(&self) -> Self {
        match self {
            ProductStatus::Active => ProductStatus::Inactive,
            _ => ProductStatus::Active,
        }
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Active
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product. Owner of the stock that line items reserve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code shown on invoices.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Price in cents. Always positive.
    pub price_cents: i64,

    /// Units available for new reservations. Never negative.
    pub stock: i64,

    pub status: ProductStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if the product accepts new reservations at all.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// ACTIVE and at least one unit in stock.
    pub fn is_available(&self) -> bool {
        self.is_active() && self.stock > 0
    }

    /// Stock at or below the replenishment threshold.
    pub fn is_stock_critical(&self, threshold: i64) -> bool {
        self.stock <= threshold
    }
}

/// Parameters for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    /// Defaults to ACTIVE when omitted.
    pub status: Option<ProductStatus>,
}

impl NewProduct {
    /// Status the product is created with.
    ///
    /// Zero stock always wins: a product created empty is OUT_OF_STOCK
    /// regardless of the requested status.
    pub fn initial_status(&self) -> ProductStatus {
        if self.stock <= 0 {
            return ProductStatus::OutOfStock;
        }
        self.status.unwrap_or_default()
    }
}

/// Partial update of a product's catalog fields.
///
/// Stock is deliberately absent; use the ledger's restock operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub status: Option<ProductStatus>,
}

impl Product {
    /// Applies a catalog update in place.
    ///
    /// When no explicit status is supplied and the product has no stock,
    /// the status moves to OUT_OF_STOCK.
    pub fn apply_update(&mut self, update: ProductUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(price_cents) = update.price_cents {
            self.price_cents = price_cents;
        }
        match update.status {
            Some(status) => self.status = status,
            None if self.stock <= 0 => self.status = ProductStatus::OutOfStock,
            None => {}
        }
        self.updated_at = now;
    }
}

// =============================================================================
// Order creation
// =============================================================================

/// Parameters for opening a new order.
///
/// Customer and salesperson are references resolved by the caller's
/// authentication layer; the engine stores them as opaque ids.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub customer_id: String,
    pub salesperson_id: String,
    pub notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, status: ProductStatus) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "LAP-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            price_cents: 5000,
            stock,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(200);
        assert_eq!(rate.bps(), 200);
        assert_eq!(TaxRate::zero().bps(), 0);
    }

    #[test]
    fn test_tax_rate_default_is_two_percent() {
        assert_eq!(TaxRate::default(), TaxRate::from_bps(200));
    }

    #[test]
    fn test_product_status_serialization() {
        let json = serde_json::to_string(&ProductStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"OUT_OF_STOCK\"");
        assert_eq!(ProductStatus::Discontinued.to_string(), "DISCONTINUED");
    }

    #[test]
    fn test_product_status_toggle() {
        assert_eq!(ProductStatus::Active.toggled(), ProductStatus::Inactive);
        assert_eq!(ProductStatus::Inactive.toggled(), ProductStatus::Active);
        assert_eq!(ProductStatus::OutOfStock.toggled(), ProductStatus::Active);
    }

    #[test]
    fn test_new_product_with_zero_stock_is_out_of_stock() {
        let new = NewProduct {
            sku: "X-1".to_string(),
            name: "Thing".to_string(),
            description: None,
            price_cents: 100,
            stock: 0,
            status: Some(ProductStatus::Active),
        };
        assert_eq!(new.initial_status(), ProductStatus::OutOfStock);

        let stocked = NewProduct { stock: 4, status: None, ..new };
        assert_eq!(stocked.initial_status(), ProductStatus::Active);
    }

    #[test]
    fn test_apply_update_adjusts_status_for_empty_stock() {
        let mut p = product(0, ProductStatus::Active);
        p.apply_update(
            ProductUpdate {
                price_cents: Some(7000),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(p.price_cents, 7000);
        assert_eq!(p.status, ProductStatus::OutOfStock);

        // An explicit status is respected
        let mut p = product(0, ProductStatus::OutOfStock);
        p.apply_update(
            ProductUpdate {
                status: Some(ProductStatus::Discontinued),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(p.status, ProductStatus::Discontinued);
    }

    #[test]
    fn test_availability() {
        assert!(product(2, ProductStatus::Active).is_available());
        assert!(!product(0, ProductStatus::Active).is_available());
        assert!(!product(5, ProductStatus::Inactive).is_available());
        assert!(product(3, ProductStatus::Active).is_stock_critical(3));
        assert!(!product(4, ProductStatus::Active).is_stock_critical(3));
    }
}
