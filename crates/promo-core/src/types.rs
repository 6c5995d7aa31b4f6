//! # Domain Types
//!
//! Core domain types for discount evaluation and usage accounting.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Discount     │   │    Customer     │   │ CustomerUsage   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  discount_id    │       │
//! │  │  code (business)│   │  name           │   │  customer_id    │       │
//! │  │  value rule     │   │  is_member      │   │  redemptions    │       │
//! │  │  usage budget   │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │  DiscountType   │   │  Applicability   │   │ RejectionReason │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  Percentage     │   │  All             │   │  Inactive       │      │
//! │  │  Fixed          │   │  Member          │   │  Expired        │      │
//! │  └─────────────────┘   │  SpecificCustomer│   │  ... (11 codes) │      │
//! │                        └──────────────────┘   └─────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A discount has:
//! - `id`: UUID v4 - immutable, used for database relations and automatic
//!   (code-less) member discounts
//! - `code`: human-typed promotional code, matched case-insensitively

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Discount Type
// =============================================================================

/// How the discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the cart subtotal, 0-100.
    Percentage,
    /// `discount_value` is an absolute amount in whole currency units.
    Fixed,
}

// =============================================================================
// Applicability
// =============================================================================

/// Who a discount may be applied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    /// Any sale, including walk-in customers.
    All,
    /// Requires a resolved customer with member status.
    Member,
    /// Requires the request's customer to match `Discount::customer_id`.
    SpecificCustomer,
}

// =============================================================================
// Rejection Reason
// =============================================================================

/// Why a validation did not produce an applicable discount.
///
/// ## Contract
/// These are returned as *data* in [`ValidationOutcome::error_code`], never
/// raised as faults. The serialized code is stable; the caller surface maps
/// each code to a localized message.
///
/// ## Retry Semantics
/// Only [`RejectionReason::TemporarilyUnavailable`] is retryable. Every other
/// reason is terminal for that request: retrying `BelowMinimumPurchase` with
/// the same cart cannot succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No discount record matches the given code or id.
    NotFound,
    /// Administrative kill switch is off.
    Inactive,
    /// The validity window has not opened yet.
    NotStarted,
    /// The validity window has closed (end date is inclusive through the end
    /// of that calendar day).
    Expired,
    /// Discount is scoped to a different store.
    StoreMismatch,
    /// Member-only discount and the customer is not a member (or the request
    /// carries no customer at all).
    NotMember,
    /// Discount is reserved for a different customer.
    CustomerMismatch,
    /// Cart subtotal is under `min_purchase`.
    BelowMinimumPurchase,
    /// Global usage budget is spent.
    GloballyExhausted,
    /// This customer has spent their per-customer budget.
    PerCustomerExhausted,
    /// Storage contention or timeout during reservation. Nothing was mutated.
    TemporarilyUnavailable,
}

impl RejectionReason {
    /// Stable wire code for this reason (matches the serde representation).
    pub const fn as_code(&self) -> &'static str {
        match self {
            RejectionReason::NotFound => "not_found",
            RejectionReason::Inactive => "inactive",
            RejectionReason::NotStarted => "not_started",
            RejectionReason::Expired => "expired",
            RejectionReason::StoreMismatch => "store_mismatch",
            RejectionReason::NotMember => "not_member",
            RejectionReason::CustomerMismatch => "customer_mismatch",
            RejectionReason::BelowMinimumPurchase => "below_minimum_purchase",
            RejectionReason::GloballyExhausted => "globally_exhausted",
            RejectionReason::PerCustomerExhausted => "per_customer_exhausted",
            RejectionReason::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, RejectionReason::TemporarilyUnavailable)
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount rule definition.
///
/// Created and edited by the administrative surface; this engine only reads
/// definitions and atomically mutates `usage_count` through the usage
/// accountant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Discount {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Promotional code, matched case-insensitively. `None` for discounts
    /// applied by id alone (automatic member discounts).
    pub code: Option<String>,

    /// Display label shown on receipts and in the admin surface.
    pub name: String,

    /// How `discount_value` is interpreted.
    pub discount_type: DiscountType,

    /// Percentage (0-100) or fixed amount in whole currency units.
    pub discount_value: i64,

    /// Minimum cart subtotal required, 0 = no minimum.
    pub min_purchase: i64,

    /// Cap on the computed amount. 0 = uncapped. Only enforced for
    /// percentage-type discounts.
    pub max_discount: i64,

    /// Who the discount applies to.
    pub applicable_to: Applicability,

    /// Set iff `applicable_to` is `SpecificCustomer`.
    pub customer_id: Option<String>,

    /// Scopes the discount to one store when set.
    pub store_id: Option<String>,

    /// Applied without a code at checkout when eligible (member pricing).
    pub is_automatic: bool,

    /// Global redemption budget. 0 = unlimited.
    pub usage_limit: i64,

    /// Redemptions so far. Never exceeds `usage_limit` when the latter is
    /// nonzero, including under concurrent reservations.
    pub usage_count: i64,

    /// Per-customer redemption cap. 0 = unlimited.
    pub usage_per_customer: i64,

    /// Start of the validity window. `None` = always started.
    pub start_date: Option<DateTime<Utc>>,

    /// End of the validity window, inclusive through the end of that
    /// calendar day. `None` = never expires.
    pub end_date: Option<DateTime<Utc>>,

    /// Administrative kill switch, independent of the date window.
    pub is_active: bool,

    /// When the definition was created.
    pub created_at: DateTime<Utc>,

    /// When the definition was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Whether a global usage budget applies.
    #[inline]
    pub fn has_usage_limit(&self) -> bool {
        self.usage_limit > 0
    }

    /// Advisory check of the global budget from this snapshot.
    ///
    /// The authoritative check happens inside the usage accountant's
    /// conditional update; this only exists to short-circuit before doing
    /// any computation.
    #[inline]
    pub fn budget_spent(&self) -> bool {
        self.has_usage_limit() && self.usage_count >= self.usage_limit
    }

    /// The discount value as money, for fixed-type discounts.
    #[inline]
    pub fn fixed_value(&self) -> Money {
        Money::from_units(self.discount_value)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer facts the engine needs for eligibility decisions.
///
/// Customer lifecycle is owned by the excluded management surface; only the
/// membership flag matters here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub is_member: bool,
}

// =============================================================================
// Customer Usage
// =============================================================================

/// Per-customer redemption counter for a `usage_per_customer`-limited
/// discount. Created on first redemption, incremented on each subsequent
/// one, decremented only by a compensating release.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerUsage {
    pub discount_id: String,
    pub customer_id: String,
    pub redemption_count: i64,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Validation Request
// =============================================================================

/// A candidate sale asking whether a discount applies.
///
/// Transient: nothing in this struct is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Promotional code (case-insensitive) or discount id.
    pub code_or_id: String,

    /// Resolved customer for the sale. `None` = walk-in/guest.
    pub customer_id: Option<String>,

    /// Store the sale is happening in.
    pub store_id: Option<String>,

    /// Cart subtotal the discount would apply to, whole currency units.
    pub cart_amount: i64,

    /// `true` = UI feedback only, never consumes usage budget.
    /// `false` = committing validation at the moment the sale is finalized.
    pub preview: bool,
}

impl ValidationRequest {
    /// A non-committing request (UI "check this code" interactions).
    pub fn preview(code_or_id: impl Into<String>, cart_amount: i64) -> Self {
        ValidationRequest {
            code_or_id: code_or_id.into(),
            customer_id: None,
            store_id: None,
            cart_amount,
            preview: true,
        }
    }

    /// A committing request (sale finalization).
    pub fn committing(code_or_id: impl Into<String>, cart_amount: i64) -> Self {
        ValidationRequest {
            preview: false,
            ..ValidationRequest::preview(code_or_id, cart_amount)
        }
    }

    /// Builder-style customer assignment.
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Builder-style store assignment.
    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }
}

// =============================================================================
// Discount Snapshot
// =============================================================================

/// The definition fields echoed back to the caller on success.
///
/// Live bookkeeping (`usage_count`) and audit timestamps are deliberately
/// not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountSnapshot {
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_purchase: i64,
    pub max_discount: i64,
    pub applicable_to: Applicability,
    pub store_id: Option<String>,
    pub is_automatic: bool,
}

impl From<&Discount> for DiscountSnapshot {
    fn from(d: &Discount) -> Self {
        DiscountSnapshot {
            id: d.id.clone(),
            code: d.code.clone(),
            name: d.name.clone(),
            discount_type: d.discount_type,
            discount_value: d.discount_value,
            min_purchase: d.min_purchase,
            max_discount: d.max_discount,
            applicable_to: d.applicable_to,
            store_id: d.store_id.clone(),
            is_automatic: d.is_automatic,
        }
    }
}

// =============================================================================
// Validation Outcome
// =============================================================================

/// The unified result of a validation request.
///
/// Exactly one of two shapes:
/// - `valid = true` with `discount` and `discount_amount` set
/// - `valid = false` with `error_code` set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountSnapshot>,

    /// Computed monetary value, whole currency units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<RejectionReason>,
}

impl ValidationOutcome {
    /// Successful outcome carrying the matched definition and amount.
    pub fn approved(snapshot: DiscountSnapshot, amount: Money) -> Self {
        ValidationOutcome {
            valid: true,
            discount: Some(snapshot),
            discount_amount: Some(amount.units()),
            error_code: None,
        }
    }

    /// Failed outcome carrying the typed reason.
    pub fn rejected(reason: RejectionReason) -> Self {
        ValidationOutcome {
            valid: false,
            discount: None,
            discount_amount: None,
            error_code: Some(reason),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_codes_are_stable() {
        assert_eq!(RejectionReason::NotFound.as_code(), "not_found");
        assert_eq!(
            RejectionReason::BelowMinimumPurchase.as_code(),
            "below_minimum_purchase"
        );
        assert_eq!(
            RejectionReason::TemporarilyUnavailable.as_code(),
            "temporarily_unavailable"
        );

        // serde representation must agree with as_code()
        let json = serde_json::to_string(&RejectionReason::PerCustomerExhausted).unwrap();
        assert_eq!(json, "\"per_customer_exhausted\"");
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(RejectionReason::TemporarilyUnavailable.is_retryable());
        assert!(!RejectionReason::GloballyExhausted.is_retryable());
        assert!(!RejectionReason::BelowMinimumPurchase.is_retryable());
        assert!(!RejectionReason::Expired.is_retryable());
    }

    #[test]
    fn test_budget_spent_precheck() {
        let mut d = sample_discount();
        d.usage_limit = 0;
        d.usage_count = 1_000_000;
        assert!(!d.budget_spent()); // 0 = unlimited

        d.usage_limit = 5;
        d.usage_count = 4;
        assert!(!d.budget_spent());

        d.usage_count = 5;
        assert!(d.budget_spent());
    }

    #[test]
    fn test_snapshot_hides_bookkeeping() {
        let d = sample_discount();
        let snapshot = DiscountSnapshot::from(&d);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["id"], d.id);
        assert_eq!(json["discount_type"], "percentage");
        assert!(json.get("usage_count").is_none());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_outcome_shapes() {
        let d = sample_discount();
        let ok = ValidationOutcome::approved(DiscountSnapshot::from(&d), Money::from_units(500));
        assert!(ok.valid);
        assert_eq!(ok.discount_amount, Some(500));
        assert!(ok.error_code.is_none());

        let bad = ValidationOutcome::rejected(RejectionReason::Inactive);
        assert!(!bad.valid);
        assert!(bad.discount.is_none());
        assert_eq!(bad.error_code, Some(RejectionReason::Inactive));
    }

    fn sample_discount() -> Discount {
        let now = Utc::now();
        Discount {
            id: "11111111-1111-1111-1111-111111111111".to_string(),
            code: Some("WELCOME10".to_string()),
            name: "Welcome 10%".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            min_purchase: 0,
            max_discount: 0,
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
}
