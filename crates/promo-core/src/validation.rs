//! # Definition Validation
//!
//! Internal-coherence checks for discount definitions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin surface (excluded from this engine)                    │
//! │  ├── Form-level checks at authoring time                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Re-checked when the engine loads a record                         │
//! │  └── A hand-edited or corrupted row is refused, not evaluated          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on the counters                                 │
//! │  └── UNIQUE constraint on the code                                     │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{DefinitionError, DefinitionResult};
use crate::types::{Applicability, Discount, DiscountType};
use crate::PERCENT_MAX;

/// Validates a discount definition's internal invariants.
///
/// ## Rules
/// - Percentage values stay inside [0, 100]
/// - `discount_value`, `min_purchase`, `max_discount` are non-negative
/// - `SpecificCustomer` carries a customer id; other applicabilities do not
/// - `usage_count` never exceeds a nonzero `usage_limit`
/// - The validity window does not end before it starts
///
/// ## Example
/// ```rust,ignore
/// validate_definition(&discount)?;
/// ```
pub fn validate_definition(discount: &Discount) -> DefinitionResult<()> {
    if discount.discount_value < 0 {
        return Err(DefinitionError::NegativeAmount {
            id: discount.id.clone(),
            field: "discount_value",
            value: discount.discount_value,
        });
    }

    if discount.min_purchase < 0 {
        return Err(DefinitionError::NegativeAmount {
            id: discount.id.clone(),
            field: "min_purchase",
            value: discount.min_purchase,
        });
    }

    if discount.max_discount < 0 {
        return Err(DefinitionError::NegativeAmount {
            id: discount.id.clone(),
            field: "max_discount",
            value: discount.max_discount,
        });
    }

    if discount.discount_type == DiscountType::Percentage && discount.discount_value > PERCENT_MAX
    {
        return Err(DefinitionError::PercentageOutOfRange {
            id: discount.id.clone(),
            value: discount.discount_value,
        });
    }

    // SpecificCustomer always carries a customer id; Member and All never do
    let wants_customer = discount.applicable_to == Applicability::SpecificCustomer;
    if wants_customer != discount.customer_id.is_some() {
        return Err(DefinitionError::ApplicabilityMismatch {
            id: discount.id.clone(),
        });
    }

    if discount.usage_limit > 0 && discount.usage_count > discount.usage_limit {
        return Err(DefinitionError::UsageOverrun {
            id: discount.id.clone(),
            count: discount.usage_count,
            limit: discount.usage_limit,
        });
    }

    if let (Some(start), Some(end)) = (discount.start_date, discount.end_date) {
        if end < start {
            return Err(DefinitionError::InvertedWindow {
                id: discount.id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
