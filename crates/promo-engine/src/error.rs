//! # Engine Error Types
//!
//! Infrastructure faults surfaced by the validation service.
//!
//! These are the failures that are NOT part of the outcome contract: a
//! rejected discount travels back as `ValidationOutcome` data, while a lost
//! database or a corrupted definition is a genuine fault the caller cannot
//! translate into a customer-facing message.

use thiserror::Error;

use promo_core::DefinitionError;
use promo_db::DbError;

/// Validation service errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage layer failure (connection loss, migration failure, query
    /// error). Pool timeouts and lock contention are mapped to the
    /// retryable `temporarily_unavailable` outcome before reaching here.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// A loaded discount definition failed its coherence check. The row is
    /// refused rather than evaluated; the admin surface owns the fix.
    #[error("Invalid discount definition: {0}")]
    Definition(#[from] DefinitionError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
