//! # Repository Module
//!
//! Database repository implementations for the discount engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Validation Service                                                    │
//! │       │                                                                 │
//! │       │  db.discounts().resolve("WELCOME10")                           │
//! │       │  db.usage().reserve(&id, customer)                             │
//! │       ▼                                                                 │
//! │  DiscountRepository / CustomerRepository / UsageRepository             │
//! │       │                                                                 │
//! │       │  SQL (conditional writes where counters are involved)          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The one concurrency-sensitive write path lives in a single file    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DiscountRepository`] - Definition resolution and insertion
//! - [`CustomerRepository`] - Member lookups
//! - [`UsageRepository`] - Atomic reserve/release usage accounting

pub mod customer;
pub mod discount;
pub mod usage;

pub use customer::CustomerRepository;
pub use discount::DiscountRepository;
pub use usage::{ReleaseOutcome, ReserveOutcome, UsageRepository, WALK_IN_KEY};
