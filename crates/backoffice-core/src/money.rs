//! # Money Module
//!
//! Provides the `Money` type used for every order amount.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ORDER TOTALS ARE DERIVED STATE                                         │
//! │                                                                         │
//! │  Totals are recomputed after every line-item or discount change.        │
//! │  With floating point, a long edit session accumulates drift:            │
//! │    100.0 * 0.02 + ... + 0.1 + 0.2  → 102.30000000000001                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every recomputation starts from line subtotals in cents and rounds   │
//! │    exactly once (tax, percentage discount). Same input, same output.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use backoffice_core::money::Money;
//! use backoffice_core::types::TaxRate;
//!
//! let unit_price = Money::from_cents(5000); // $50.00
//! let subtotal = unit_price.multiply_quantity(2);
//! assert_eq!(subtotal.cents(), 10000);
//!
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(200));
//! assert_eq!(tax.cents(), 200); // 2%
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed so intermediate results such as `subtotal - discount` can be
/// represented before they are floored at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Floors the value at zero.
    ///
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-250).floor_at_zero(), Money::zero());
    /// assert_eq!(Money::from_cents(250).floor_at_zero().cents(), 250);
    /// ```
    #[inline]
    pub const fn floor_at_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Calculates tax on this amount, rounding half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use backoffice_core::money::Money;
    /// use backoffice_core::types::TaxRate;
    ///
    /// // $90.00 at 2% = $1.80
    /// let tax = Money::from_cents(9000).calculate_tax(TaxRate::from_bps(200));
    /// assert_eq!(tax.cents(), 180);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.basis_points(rate.bps())
    }

    /// Returns `bps / 10000` of this amount, rounded half-up to the cent.
    ///
    /// Used for percentage discounts: 1000 bps is 10%.
    ///
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000);
    /// assert_eq!(subtotal.basis_points(1000).cents(), 1000);
    /// assert_eq!(subtotal.basis_points(10000), subtotal);
    /// ```
    pub fn basis_points(&self, bps: u32) -> Money {
        // i128 keeps large order amounts from overflowing
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use backoffice_core::money::Money;
    ///
    /// let line = Money::from_cents(299).multiply_quantity(3);
    /// assert_eq!(line.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. The admin frontend does its own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
