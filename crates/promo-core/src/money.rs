//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 10% discount computed in floats can land a cent off the cap and     │
//! │  either cheat the customer or the store.                               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer whole-currency units                            │
//! │    Amounts in this domain carry no fractional minor units, so i64      │
//! │    covers every cart. Rounding happens exactly once, at the final      │
//! │    step of a percentage computation, half-up.                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use promo_core::money::Money;
//!
//! let cart = Money::from_units(200_000);
//! let ten_percent = cart.percentage(10);
//! assert_eq!(ten_percent.units(), 20_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic stays closed under subtraction; negative
///   intermediate values are representable even though the engine's outputs
///   are clamped non-negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
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

    /// Computes a percentage of this amount, rounding half-up at the final
    /// step.
    ///
    /// ## Rounding Rule
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ROUND ONCE, AT THE END                                             │
    /// │                                                                     │
    /// │  raw = amount × percent / 100                                       │
    /// │                                                                     │
    /// │  Integer math: (amount × percent + 50) / 100                        │
    /// │  The +50 provides half-up rounding (50/100 = 0.5)                   │
    /// │                                                                     │
    /// │  Rounding at intermediate steps compounds error; a single final    │
    /// │  rounding keeps the result within half a unit of exact.            │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use promo_core::money::Money;
    ///
    /// // 15% of 333 = 49.95, rounds up to 50
    /// assert_eq!(Money::from_units(333).percentage(15).units(), 50);
    ///
    /// // 10% of 234 = 23.4, rounds down to 23
    /// assert_eq!(Money::from_units(234).percentage(10).units(), 23);
    /// ```
    pub fn percentage(&self, percent: i64) -> Money {
        // i128 intermediate so cart × percent cannot overflow
        let raw = (self.0 as i128 * percent as i128 + 50) / 100;
        Money(raw as i64)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Clamps this amount into `[0, upper]`.
    ///
    /// The engine's output contract: a discount never overshoots the cart
    /// and never goes negative.
    #[inline]
    pub fn clamp_to(self, upper: Money) -> Money {
        Money(self.0.clamp(0, upper.0.max(0)))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows the raw unit count.
///
/// ## Note
/// This is for debugging and logs. Currency formatting and localization
/// belong to the caller surface.
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let money = Money::from_units(20_000);
        assert_eq!(money.units(), 20_000);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(400);

        assert_eq!((a + b).units(), 1400);
        assert_eq!((a - b).units(), 600);

        let mut c = a;
        c += b;
        assert_eq!(c.units(), 1400);
        c -= b;
        assert_eq!(c.units(), 1000);
    }

    #[test]
    fn test_percentage_exact() {
        // 10% of 200,000 = 20,000 with no rounding needed
        assert_eq!(Money::from_units(200_000).percentage(10).units(), 20_000);
        assert_eq!(Money::from_units(100).percentage(100).units(), 100);
        assert_eq!(Money::from_units(100).percentage(0).units(), 0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 15% of 333 = 49.95 → 50
        assert_eq!(Money::from_units(333).percentage(15).units(), 50);
        // 5% of 30 = 1.5, exactly half rounds up
        assert_eq!(Money::from_units(30).percentage(5).units(), 2);
        // 10% of 234 = 23.4 → 23
        assert_eq!(Money::from_units(234).percentage(10).units(), 23);
    }

    #[test]
    fn test_percentage_large_cart_no_overflow() {
        // A cart near i64::MAX / 100 would overflow without the i128
        // intermediate
        let huge = Money::from_units(500_000_000_000_000_000);
        assert_eq!(huge.percentage(100).units(), huge.units());
    }

    #[test]
    fn test_min_and_clamp() {
        let a = Money::from_units(15_000);
        let cart = Money::from_units(10_000);

        assert_eq!(a.min(cart).units(), 10_000);
        assert_eq!(cart.min(a).units(), 10_000);

        assert_eq!(a.clamp_to(cart).units(), 10_000);
        assert_eq!(Money::from_units(-5).clamp_to(cart).units(), 0);
        assert_eq!(Money::from_units(7_500).clamp_to(cart).units(), 7_500);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_units(100);
        assert!(positive.is_positive());

        let negative = Money::from_units(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_units(20_000)), "20000");
        assert_eq!(format!("{}", Money::from_units(0)), "0");
    }
}
