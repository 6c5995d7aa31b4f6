//! # promo-engine: Validation Service for the Discount Engine
//!
//! The externally-visible surface of the discount evaluation and
//! usage-accounting engine: one `validate` operation with a preview/commit
//! distinction, a compensating `release`, and an automatic-discount listing.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Discount Engine Flow                              │
//! │                                                                         │
//! │  Point-of-Sale Surface (excluded)                                      │
//! │       │  { code_or_id, customer_id?, store_id?, cart_amount, preview } │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 promo-engine (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ValidationService::validate                                   │   │
//! │  │     resolve ─► eligibility ─► amount ─► reserve (committing)    │   │
//! │  │                                                                 │   │
//! │  │   ValidationService::release      (checkout compensation)       │   │
//! │  │   ValidationService::automatic_discounts                        │   │
//! │  └───────────┬───────────────────────────────┬─────────────────────┘   │
//! │              │ pure rules                    │ storage                 │
//! │              ▼                               ▼                         │
//! │        promo-core                       promo-db                       │
//! │   eligibility / amount           atomic reserve / release              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Outcome Contract
//! Every business-level failure is returned as data
//! ([`promo_core::ValidationOutcome`] carrying a
//! [`promo_core::RejectionReason`]); [`EngineError`] is reserved for
//! infrastructure faults the caller cannot translate into a customer-facing
//! message.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use service::ValidationService;

// Commonly needed alongside the service
pub use promo_core::{
    DiscountSnapshot, RejectionReason, ValidationOutcome, ValidationRequest,
};
pub use promo_db::{Database, DbConfig, ReleaseOutcome};
