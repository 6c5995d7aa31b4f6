//! # Discount Repository
//!
//! Database operations for discount definitions.
//!
//! ## Key Operations
//! - Record resolution by code (case-insensitive) or id
//! - Automatic-discount listing
//! - Definition insertion (used by the seed tool and tests; the production
//!   admin surface writes through its own path)
//!
//! ## Code Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   How code_or_id Resolves                               │
//! │                                                                         │
//! │  Caller sends: "welcome10"                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Match against code (COLLATE NOCASE column)                         │
//! │     "welcome10" == "WELCOME10" ← MATCH                                 │
//! │       │                                                                 │
//! │       └── no match? ──► 2. Match against id (exact)                    │
//! │                            Covers automatic discounts applied by id    │
//! │                            alone, which carry no code at all           │
//! │                                                                         │
//! │  Codes win over ids so a code can never be shadowed by an id collision │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use promo_core::Discount;

/// Column list shared by every SELECT so rows always decode the full
/// definition.
const DISCOUNT_COLUMNS: &str = "\
    id, code, name, discount_type, discount_value, \
    min_purchase, max_discount, applicable_to, customer_id, store_id, \
    is_automatic, usage_limit, usage_count, usage_per_customer, \
    start_date, end_date, is_active, created_at, updated_at";

/// Repository for discount definition operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = DiscountRepository::new(pool);
///
/// // Resolve whatever the POS surface sent
/// let discount = repo.resolve("WELCOME10").await?;
/// ```
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Gets a discount by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Discount))` - Discount found
    /// * `Ok(None)` - Discount not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1");

        let discount = sqlx::query_as::<_, Discount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(discount)
    }

    /// Gets a discount by its promotional code.
    ///
    /// The `code` column carries `COLLATE NOCASE`, so "welcome10" matches
    /// "WELCOME10" without any application-side normalization.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = ?1");

        let discount = sqlx::query_as::<_, Discount>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(discount)
    }

    /// Resolves a discount by code or id, code first.
    pub async fn resolve(&self, code_or_id: &str) -> DbResult<Option<Discount>> {
        debug!(code_or_id = %code_or_id, "Resolving discount");

        if let Some(discount) = self.get_by_code(code_or_id).await? {
            return Ok(Some(discount));
        }

        self.get_by_id(code_or_id).await
    }

    /// Lists active automatic discounts.
    ///
    /// ## Usage
    /// Candidates for code-less application at checkout (member pricing).
    /// Eligibility still runs per candidate; this only narrows the scan.
    pub async fn list_automatic(&self) -> DbResult<Vec<Discount>> {
        let sql = format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts \
             WHERE is_automatic = 1 AND is_active = 1 \
             ORDER BY name"
        );

        let discounts = sqlx::query_as::<_, Discount>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(discounts)
    }

    /// Inserts a new discount definition.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, discount: &Discount) -> DbResult<()> {
        debug!(id = %discount.id, code = ?discount.code, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, code, name, discount_type, discount_value,
                min_purchase, max_discount, applicable_to, customer_id, store_id,
                is_automatic, usage_limit, usage_count, usage_per_customer,
                start_date, end_date, is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.code)
        .bind(&discount.name)
        .bind(discount.discount_type)
        .bind(discount.discount_value)
        .bind(discount.min_purchase)
        .bind(discount.max_discount)
        .bind(discount.applicable_to)
        .bind(&discount.customer_id)
        .bind(&discount.store_id)
        .bind(discount.is_automatic)
        .bind(discount.usage_limit)
        .bind(discount.usage_count)
        .bind(discount.usage_per_customer)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts discount definitions (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Reads the live usage counter directly.
    ///
    /// Tests and diagnostics only; validation flows read the whole record.
    pub async fn usage_count(&self, id: &str) -> DbResult<Option<i64>> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT usage_count FROM discounts WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Helper to generate a new discount ID.
pub fn generate_discount_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
