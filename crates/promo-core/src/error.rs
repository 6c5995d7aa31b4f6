//! # Error Types
//!
//! Domain-specific error types for promo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  promo-core errors (this file)                                         │
//! │  └── DefinitionError  - Malformed discount definitions                 │
//! │                                                                         │
//! │  promo-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  promo-engine errors (separate crate)                                  │
//! │  └── EngineError      - Orchestration/infrastructure faults            │
//! │                                                                         │
//! │  NOT AN ERROR: RejectionReason (types.rs)                              │
//! │  Eligibility failures are returned to callers as data. Only genuine    │
//! │  faults travel through these error enums.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, field, value)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Definition Error
// =============================================================================

/// A discount definition that violates its own invariants.
///
/// Definitions are authored by the administrative surface; the engine
/// re-checks them on load so a corrupted or hand-edited row cannot produce
/// a nonsensical discount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// Percentage value outside [0, 100].
    #[error("discount {id}: percentage value {value} is outside 0-100")]
    PercentageOutOfRange { id: String, value: i64 },

    /// A monetary field is negative.
    #[error("discount {id}: {field} must be non-negative, got {value}")]
    NegativeAmount {
        id: String,
        field: &'static str,
        value: i64,
    },

    /// `SpecificCustomer` applicability without a customer id, or a
    /// customer id on a non-specific discount.
    #[error("discount {id}: applicability and customer_id disagree")]
    ApplicabilityMismatch { id: String },

    /// Usage counters out of agreement (count above a nonzero limit).
    #[error("discount {id}: usage_count {count} exceeds usage_limit {limit}")]
    UsageOverrun { id: String, count: i64, limit: i64 },

    /// Validity window ends before it starts.
    #[error("discount {id}: end_date precedes start_date")]
    InvertedWindow { id: String },
}

/// Result type for definition validation.
pub type DefinitionResult<T> = Result<T, DefinitionError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DefinitionError::PercentageOutOfRange {
            id: "d-1".to_string(),
            value: 150,
        };
        assert_eq!(
            err.to_string(),
            "discount d-1: percentage value 150 is outside 0-100"
        );

        let err = DefinitionError::NegativeAmount {
            id: "d-2".to_string(),
            field: "min_purchase",
            value: -5,
        };
        assert_eq!(
            err.to_string(),
            "discount d-2: min_purchase must be non-negative, got -5"
        );
    }
}
