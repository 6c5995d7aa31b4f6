//! # Eligibility Evaluator
//!
//! Decides whether a discount's static and contextual rules permit its use
//! for a given request.
//!
//! ## Rule Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Eligibility Checks (first failure wins)                    │
//! │                                                                         │
//! │   1. is_active           → Inactive                                    │
//! │   2. start_date          → NotStarted                                  │
//! │   3. end_date            → Expired   (inclusive through end of day)    │
//! │   4. store scope         → StoreMismatch                               │
//! │   5. member requirement  → NotMember                                   │
//! │   6. customer binding    → CustomerMismatch                            │
//! │   7. minimum purchase    → BelowMinimumPurchase                        │
//! │   8. global budget       → GloballyExhausted      (advisory pre-check) │
//! │   9. per-customer budget → PerCustomerExhausted   (advisory pre-check) │
//! │                                                                         │
//! │  The order is part of the contract: failure-reason precedence must be  │
//! │  deterministic so callers and tests can rely on it.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checks 8 and 9 are cheap pre-checks against the loaded snapshot. The
//! authoritative, race-free budget decision is made by the usage accountant's
//! conditional update at reservation time.
//!
//! Everything here is pure and side-effect free, which is what makes preview
//! validation safe to call from the UI at any frequency.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{Applicability, Discount, RejectionReason};

// =============================================================================
// Evaluation Context
// =============================================================================

/// Resolved facts about the request, gathered by the caller.
///
/// The evaluator never does I/O; whoever orchestrates it resolves the
/// customer record and the per-customer usage count first and passes the
/// facts in.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Customer on the sale. `None` = walk-in/guest.
    pub customer_id: Option<&'a str>,

    /// Store the sale is happening in.
    pub store_id: Option<&'a str>,

    /// Cart subtotal the discount would apply to.
    pub cart_amount: Money,

    /// Resolved member status. `false` when the customer is unknown, not a
    /// member, or the request carries no customer.
    pub customer_is_member: bool,

    /// The customer's redemption count for this discount. 0 when there is
    /// no usage record (or no customer).
    pub customer_redemptions: i64,
}

impl<'a> EvaluationContext<'a> {
    /// Context for an anonymous walk-in sale.
    pub fn walk_in(cart_amount: Money) -> Self {
        EvaluationContext {
            customer_id: None,
            store_id: None,
            cart_amount,
            customer_is_member: false,
            customer_redemptions: 0,
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Evaluates a discount against a request context at a point in time.
///
/// Returns `Ok(())` when every rule passes, otherwise the first failing
/// rule's [`RejectionReason`].
pub fn evaluate(
    discount: &Discount,
    ctx: &EvaluationContext<'_>,
    now: DateTime<Utc>,
) -> Result<(), RejectionReason> {
    // 1. Administrative kill switch, independent of the date window
    if !discount.is_active {
        return Err(RejectionReason::Inactive);
    }

    // 2. Window has not opened: exact-instant comparison
    if let Some(start) = discount.start_date {
        if now < start {
            return Err(RejectionReason::NotStarted);
        }
    }

    // 3. Window has closed: the end date is honored through the end of that
    //    calendar day, so 2025-01-31T23:59:59 is still valid against an end
    //    date of 2025-01-31
    if let Some(end) = discount.end_date {
        if now.date_naive() > end.date_naive() {
            return Err(RejectionReason::Expired);
        }
    }

    // 4. Store scoping: a scoped discount cannot validate against a request
    //    for another store, or one that names no store at all
    if let Some(required_store) = discount.store_id.as_deref() {
        if ctx.store_id != Some(required_store) {
            return Err(RejectionReason::StoreMismatch);
        }
    }

    // 5/6. Targeting
    match discount.applicable_to {
        Applicability::All => {}
        Applicability::Member => {
            // A request with no customer fails the member requirement
            if ctx.customer_id.is_none() || !ctx.customer_is_member {
                return Err(RejectionReason::NotMember);
            }
        }
        Applicability::SpecificCustomer => {
            if ctx.customer_id != discount.customer_id.as_deref() {
                return Err(RejectionReason::CustomerMismatch);
            }
        }
    }

    // 7. Minimum purchase: equal to the minimum passes
    if ctx.cart_amount.units() < discount.min_purchase {
        return Err(RejectionReason::BelowMinimumPurchase);
    }

    // 8. Global budget pre-check (advisory; accountant decides)
    if discount.budget_spent() {
        return Err(RejectionReason::GloballyExhausted);
    }

    // 9. Per-customer budget pre-check (advisory; accountant decides)
    if discount.usage_per_customer > 0 && ctx.customer_redemptions >= discount.usage_per_customer
    {
        return Err(RejectionReason::PerCustomerExhausted);
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
