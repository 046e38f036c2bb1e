//! # Money Module
//!
//! Provides the `Money` type for handling prices, costs and profits safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Spreadsheet cells arrive as f64:                                       │
//! │    1299 × 0.36 = 467.64000000000004  ❌                                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents (fen)                                      │
//! │    129900 cents × 360 / 1000 = 46764 cents = ¥467.64                    │
//! │    The cell decimal is converted exactly ONCE, at the sheet boundary.   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use arb_core::money::Money;
//! use arb_core::types::DiscountFactor;
//!
//! let tag = Money::from_cents(100_000); // ¥1000.00
//! let cost = tag.apply_discount(DiscountFactor::from_hundredths(360));
//! assert_eq!(cost.cents(), 36_000); // ¥360.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};
use ts_rs::TS;

use crate::types::{DiscountFactor, FeeRate};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents / fen).
///
/// ## Design Decisions
/// - **i64 (signed)**: profits of unmatched SKUs are negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Ord**: results are ranked by profit directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a spreadsheet decimal amount (yuan) into Money.
    ///
    /// This is the only place a float becomes money: the value is rounded
    /// to the nearest cent. Non-finite input yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use arb_core::money::Money;
    ///
    /// assert_eq!(Money::from_amount(1299.0).cents(), 129_900);
    /// assert_eq!(Money::from_amount(467.64).cents(), 46_764);
    /// ```
    pub fn from_amount(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units (for display and export only).
    #[inline]
    pub fn amount(&self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Applies a 0–10 discount factor: `self × factor / 10`.
    ///
    /// ## Implementation
    /// The factor is held in hundredths (3.6 → 360, full price → 1000), so
    /// the formula is `(cents × hundredths + 500) / 1000` in i128.
    /// The +500 rounds half up.
    ///
    /// ## User Workflow
    /// ```text
    /// Tag price: ¥1000.00, supplier factor 3.6
    ///      │
    ///      ▼
    /// apply_discount(3.6) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Cost price: ¥360.00
    /// ```
    pub fn apply_discount(&self, factor: DiscountFactor) -> Money {
        let scaled = (self.0 as i128 * factor.hundredths() as i128 + 500) / 1000;
        Money::from_cents(scaled as i64)
    }

    /// Deducts a platform fee and returns what the seller keeps.
    ///
    /// ## Example
    /// ```rust
    /// use arb_core::money::Money;
    /// use arb_core::types::FeeRate;
    ///
    /// let market = Money::from_cents(200_000); // ¥2000.00
    /// let net = market.net_of_fee(FeeRate::from_bps(1200)); // 12% fee
    /// assert_eq!(net.cents(), 176_000);
    /// ```
    pub fn net_of_fee(&self, fee: FeeRate) -> Money {
        let fee_cents = (self.0 as i128 * fee.bps() as i128 + 5000) / 10000;
        Money::from_cents(self.0 - fee_cents as i64)
    }

    /// Ratio of this amount to `base`, e.g. profit over cost.
    ///
    /// Returns 0.0 when `base` is zero.
    pub fn ratio_to(&self, base: Money) -> f64 {
        if base.is_zero() {
            return 0.0;
        }
        self.0 as f64 / base.0 as f64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money with two decimals and a yuan sign.
///
/// ## Note
/// This is for reports and the assistant summary. Table rendering is done
/// by the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}¥{}.{:02}", sign, abs / 100, abs % 100)
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

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Negation, used for the loss shown on unmatched SKUs.
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
