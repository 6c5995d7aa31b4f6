//! # promo-core: Pure Business Logic for the Discount Engine
//!
//! This crate is the **heart** of the discount evaluation and
//! usage-accounting engine. It contains all business rules as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Discount Engine Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Point-of-Sale Surface (excluded from core)           │   │
//! │  │     "check this code" preview ──► committing checkout call      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   promo-engine (Validation Service)             │   │
//! │  │     resolve record ─► eligibility ─► amount ─► reserve          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ promo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌────────────┐  │   │
//! │  │   │   types   │  │   money   │  │eligibility│  │   amount   │  │   │
//! │  │   │ Discount  │  │  Money    │  │  ordered  │  │ percentage │  │   │
//! │  │   │ Outcome   │  │ half-up   │  │  checks   │  │ caps/clamp │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    promo-db (Storage Layer)                     │   │
//! │  │        SQLite repositories, atomic usage reservation            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Discount, ValidationRequest, RejectionReason)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Definition error types
//! - [`eligibility`] - Ordered, short-circuiting eligibility rules
//! - [`amount`] - Discount amount computation
//! - [`validation`] - Definition coherence validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, side-effect free; `now` is an
//!    argument, never read from the clock
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: whole currency units in i64, half-up rounding once
//! 4. **Failures as Data**: eligibility failures are [`RejectionReason`]
//!    values returned to the caller, never panics or stringly errors
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use promo_core::amount;
//! use promo_core::eligibility::{self, EvaluationContext};
//! use promo_core::Money;
//!
//! # fn demo(discount: &promo_core::Discount) {
//! let cart = Money::from_units(200_000);
//! let ctx = EvaluationContext::walk_in(cart);
//!
//! if eligibility::evaluate(discount, &ctx, Utc::now()).is_ok() {
//!     let saved = amount::compute(discount, cart);
//!     assert!(saved.units() <= cart.units());
//! }
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod amount;
pub mod eligibility;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use promo_core::Money` instead of
// `use promo_core::money::Money`

pub use error::{DefinitionError, DefinitionResult};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound for percentage discount values.
///
/// A percentage discount can give the cart away, never more: the
/// administrative surface enforces this at authoring time and
/// [`validation::validate_definition`] re-checks it on load.
pub const PERCENT_MAX: i64 = 100;
