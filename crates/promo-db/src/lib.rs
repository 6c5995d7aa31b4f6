//! # promo-db: Database Layer for the Discount Engine
//!
//! This crate provides database access for the discount evaluation and
//! usage-accounting engine. It uses SQLite for storage with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Discount Engine Data Flow                         │
//! │                                                                         │
//! │  Validation Service (promo-engine)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     promo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ discount.rs   │    │  (embedded)  │  │   │
//! │  │   │               │    │ customer.rs   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ usage.rs ★    │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   ★ usage.rs is the only mutating path: atomic conditional     │   │
//! │  │     updates, never read-then-write                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/promo.db")).await?;
//!
//! let discount = db.discounts().resolve("WELCOME10").await?;
//! let outcome = db.usage().reserve(&discount_id, Some("customer-1")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::discount::DiscountRepository;
pub use repository::usage::{ReleaseOutcome, ReserveOutcome, UsageRepository};
