//! # Amount Calculator
//!
//! Computes the monetary value of an eligible discount.
//!
//! ## Calculation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Discount Amount Rules                                │
//! │                                                                         │
//! │  Percentage                                                             │
//! │    raw = cart × value / 100      (round half-up, once, at the end)     │
//! │    amount = min(raw, max_discount)   when max_discount > 0             │
//! │    amount = raw                      when max_discount = 0 (uncapped)  │
//! │                                                                         │
//! │  Fixed                                                                  │
//! │    amount = min(value, cart)                                            │
//! │    A fixed discount never drives the effective total negative.         │
//! │                                                                         │
//! │  Always: 0 ≤ amount ≤ cart                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Called only after eligibility passes. Pure: no state, no clock.

use crate::money::Money;
use crate::types::{Discount, DiscountType};

/// Computes the discount amount for an eligible discount against a cart
/// subtotal.
///
/// ## Example
/// ```rust,ignore
/// // 10% of 200,000 capped at 20,000 lands exactly on the cap
/// let amount = compute(&discount, Money::from_units(200_000));
/// assert_eq!(amount.units(), 20_000);
/// ```
pub fn compute(discount: &Discount, cart_amount: Money) -> Money {
    let amount = match discount.discount_type {
        DiscountType::Percentage => {
            let raw = cart_amount.percentage(discount.discount_value);
            // max_discount is only meaningful for percentage discounts
            if discount.max_discount > 0 {
                raw.min(Money::from_units(discount.max_discount))
            } else {
                raw
            }
        }
        DiscountType::Fixed => discount.fixed_value().min(cart_amount),
    };

    amount.clamp_to(cart_amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Applicability;
    use chrono::Utc;

    fn discount(discount_type: DiscountType, value: i64, max_discount: i64) -> Discount {
        let now = Utc::now();
        Discount {
            id: "d-1".to_string(),
            code: Some("TEST".to_string()),
            name: "Test".to_string(),
            discount_type,
            discount_value: value,
            min_purchase: 0,
            max_discount,
            applicable_to: Applicability::All,
            customer_id: None,
            store_id: None,
            is_automatic: false,
            usage_limit: 0,
            usage_count: 0,
            usage_per_customer: 0,
            start_date: None,
            end_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_uncapped() {
        let d = discount(DiscountType::Percentage, 10, 0);
        let amount = compute(&d, Money::from_units(150_000));
        assert_eq!(amount.units(), 15_000);
    }

    #[test]
    fn test_percentage_cap_boundary() {
        // 10% of 200,000 = 20,000, capped at exactly 20,000
        let d = discount(DiscountType::Percentage, 10, 20_000);
        let amount = compute(&d, Money::from_units(200_000));
        assert_eq!(amount.units(), 20_000);

        // One unit more cart and the cap bites
        let amount = compute(&d, Money::from_units(200_010));
        assert_eq!(amount.units(), 20_000);

        // One unit less and the raw value wins
        let amount = compute(&d, Money::from_units(199_990));
        assert_eq!(amount.units(), 19_999);
    }

    #[test]
    fn test_percentage_never_exceeds_cap() {
        let d = discount(DiscountType::Percentage, 50, 5_000);
        for cart in [0, 1, 9_999, 10_000, 10_001, 1_000_000] {
            let amount = compute(&d, Money::from_units(cart));
            assert!(amount.units() <= 5_000, "cart {cart} broke the cap");
        }
    }

    #[test]
    fn test_percentage_rounds_half_up_once() {
        // 15% of 333 = 49.95 → 50
        let d = discount(DiscountType::Percentage, 15, 0);
        assert_eq!(compute(&d, Money::from_units(333)).units(), 50);
    }

    #[test]
    fn test_fixed_within_cart() {
        let d = discount(DiscountType::Fixed, 5_000, 0);
        assert_eq!(compute(&d, Money::from_units(50_000)).units(), 5_000);
    }

    #[test]
    fn test_fixed_clamps_to_cart() {
        // Fixed 15,000 against a 10,000 cart clamps to the cart total
        let d = discount(DiscountType::Fixed, 15_000, 0);
        assert_eq!(compute(&d, Money::from_units(10_000)).units(), 10_000);
    }

    #[test]
    fn test_fixed_ignores_max_discount() {
        // max_discount only ever applies to percentage discounts
        let d = discount(DiscountType::Fixed, 8_000, 1_000);
        assert_eq!(compute(&d, Money::from_units(50_000)).units(), 8_000);
    }

    #[test]
    fn test_output_bounded_by_cart() {
        let full = discount(DiscountType::Percentage, 100, 0);
        for cart in [0, 1, 99, 12_345] {
            let amount = compute(&full, Money::from_units(cart));
            assert!(amount.units() >= 0);
            assert!(amount.units() <= cart);
        }
    }

    #[test]
    fn test_zero_cart() {
        let d = discount(DiscountType::Fixed, 1_000, 0);
        assert_eq!(compute(&d, Money::zero()).units(), 0);

        let d = discount(DiscountType::Percentage, 25, 0);
        assert_eq!(compute(&d, Money::zero()).units(), 0);
    }
}
