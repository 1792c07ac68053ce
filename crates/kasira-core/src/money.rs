//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A settlement engine that computes a cart preview on one machine and   │
//! │  the authoritative charge on another must get the SAME number on both. │
//! │  Floats make that a matter of luck; integers make it arithmetic.       │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units everywhere, with percentage        │
//! │  results rounded half-up to the minor unit exactly once, at the point │
//! │  the percentage is taken. Never per line.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasira_core::money::Money;
//!
//! let subtotal = Money::from_cents(45_000);
//!
//! // 5% member discount, rounded half-up once
//! let discount = subtotal.percent_of(5);
//! assert_eq!(discount.cents(), 2_250);
//!
//! // NEVER construct from floats; no such constructor exists.
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results (subtotal minus discounts) may
///   dip below zero before the final clamp
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// Discount stacking can push an intermediate total below zero; the
    /// published total never goes negative.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let net = Money::from_cents(1_000) - Money::from_cents(1_500);
    /// assert_eq!(net.clamp_at_zero().cents(), 0);
    /// ```
    #[inline]
    pub const fn clamp_at_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Takes a whole percentage of this amount, rounded half-up.
    ///
    /// This is the single rounding site for percentage discounts: the
    /// result is an exact integer amount that downstream arithmetic can
    /// add and subtract without accumulating error.
    ///
    /// ## Implementation
    /// Integer math: `(amount * percent + 50) / 100`. The `+50` provides
    /// half-up rounding (50/100 = 0.5). i128 intermediates prevent
    /// overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(999);
    /// // 5% of 999 = 49.95, rounds to 50
    /// assert_eq!(subtotal.percent_of(5).cents(), 50);
    /// ```
    pub fn percent_of(&self, percent: u32) -> Money {
        let cents = (self.0 as i128 * percent as i128 + 50) / 100;
        Money::from_cents(cents as i64)
    }

    /// Calculates tax on this amount, rounded half-up.
    ///
    /// ## Implementation
    /// `rate.bps()` is basis points: 1000 = 10%.
    /// Formula with rounding: `(amount_cents * bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    /// use kasira_core::types::TaxRate;
    ///
    /// let net = Money::from_cents(1000);
    /// let tax = net.calculate_tax(TaxRate::from_bps(825)); // 8.25%
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 to prevent overflow on large amounts
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(900);
    /// assert_eq!(unit_price.multiply_quantity(5).cents(), 4_500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. Callers format for actual display
/// to handle currency symbols and localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
