//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A fuel ledger is worse than a till: the weighted-average cost of a    │
//! │  tank is a repeating decimal (1000·100 + 500·110) / 1500 = 103.333...  │
//! │  and it feeds back into EVERY later sale's cost of goods. A float      │
//! │  error compounds across thousands of movements.                        │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal::Decimal                                    │
//! │    Exact 96-bit decimal arithmetic, carried at full precision through  │
//! │    the books and rounded to 2 dp only at presentation boundaries.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use forecourt_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! // Create from whole rupees or from a decimal
//! let price = Money::from_rupees(100);
//! let precise = Money::new(Decimal::new(10333, 2)); // Rs 103.33
//!
//! // Arithmetic operations
//! let total = price + precise;
//! let line = price * Decimal::from(3);
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Decimal places carried on displayed / persisted-for-display amounts.
pub const MONEY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Allows negative values for debits and reversals
/// - **Single field tuple struct**: Zero-cost abstraction over `Decimal`
/// - **Transparent serde**: Serializes as the underlying decimal string
/// - **Full precision internally**: Rounding to 2 dp happens only when a
///   value leaves the ledger (display, report cells), never in between
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from a whole number of rupees.
    ///
    /// ## Example
    /// ```rust
    /// use forecourt_core::money::Money;
    ///
    /// let price = Money::from_rupees(100);
    /// assert_eq!(price.to_string(), "Rs 100.00");
    /// ```
    #[inline]
    pub fn from_rupees(rupees: i64) -> Self {
        Money(Decimal::from(rupees))
    }

    /// Creates a Money value from rupees and paisa (1/100).
    ///
    /// ## Example
    /// ```rust
    /// use forecourt_core::money::Money;
    ///
    /// let price = Money::from_major_minor(103, 33);
    /// assert_eq!(price.to_string(), "Rs 103.33");
    /// ```
    #[inline]
    pub fn from_major_minor(major: i64, minor: i64) -> Self {
        let minor = if major < 0 { -minor } else { minor };
        Money(Decimal::from(major) + Decimal::new(minor, 2))
    }

    /// Returns the underlying decimal amount at full precision.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to 2 decimal places using banker's rounding.
    ///
    /// ## Banker's Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  BANKER'S ROUNDING (Round Half to Even)                             │
    /// │                                                                     │
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.125 → 0.13, 0.135 → 0.14, 0.145 → 0.15 (always up = +bias)    │
    /// │                                                                     │
    /// │  Banker's rounding rounds 0.5 to the nearest EVEN digit:           │
    /// │    0.125 → 0.12, 0.135 → 0.14, 0.145 → 0.14 (alternates = no bias) │
    /// │                                                                     │
    /// │  Over thousands of movements this prevents systematic loss/gain.   │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Used at presentation boundaries only. Balances and average costs are
    /// carried at full precision so the books stay reproducible.
    pub fn rounded(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Multiplies by a quantity (e.g. litres × unit price).
    #[inline]
    pub fn multiply_quantity(&self, qty: Decimal) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. Display rounds to 2 dp; the underlying
/// value keeps full precision.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-Rs {:.2}", rounded.abs())
        } else {
            write!(f, "Rs {rounded:.2}")
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Money)
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

/// Negation (for signed transaction amounts).
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a decimal quantity.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupees() {
        let money = Money::from_rupees(100);
        assert_eq!(money.amount(), Decimal::from(100));
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(103, 33);
        assert_eq!(money.amount(), Decimal::new(10333, 2));

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.amount(), Decimal::new(-550, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_major_minor(10, 99)), "Rs 10.99");
        assert_eq!(format!("{}", Money::from_rupees(5)), "Rs 5.00");
        assert_eq!(format!("{}", Money::from_major_minor(-5, 50)), "-Rs 5.50");
        assert_eq!(format!("{}", Money::zero()), "Rs 0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupees(10);
        let b = Money::from_rupees(5);

        assert_eq!((a + b).amount(), Decimal::from(15));
        assert_eq!((a - b).amount(), Decimal::from(5));
        assert_eq!((a * Decimal::from(3)).amount(), Decimal::from(30));
        assert_eq!((-a).amount(), Decimal::from(-10));
    }

    #[test]
    fn test_full_precision_survives_arithmetic() {
        // (1000·100 + 500·110) / 1500 = 103.333... must not be truncated
        let blended = Money::new(
            (Decimal::from(1000) * Decimal::from(100) + Decimal::from(500) * Decimal::from(110))
                / Decimal::from(1500),
        );
        let restocked = blended * Decimal::from(1500);
        assert_eq!(restocked.rounded().amount(), Decimal::from(155_000));
    }

    #[test]
    fn test_bankers_rounding() {
        // Midpoint cases round to even
        let down: Money = "0.125".parse().unwrap();
        assert_eq!(down.rounded().amount(), Decimal::new(12, 2));

        let up: Money = "0.135".parse().unwrap();
        assert_eq!(up.rounded().amount(), Decimal::new(14, 2));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_rupees(1);
        assert!(positive.is_positive());

        let negative = Money::from_rupees(-1);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_parse_round_trip() {
        let money: Money = "103.33".parse().unwrap();
        assert_eq!(money.amount().to_string(), "103.33");
    }
}
