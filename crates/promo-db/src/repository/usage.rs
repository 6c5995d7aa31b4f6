//! # Usage Repository (Usage Accountant)
//!
//! The one mutating, concurrency-sensitive component of the engine:
//! atomically reserves and releases units of a discount's usage budget.
//!
//! ## The Last-Ticket Race
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  usage_limit = 3, usage_count = 2: one ticket left                      │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write                                             │
//! │     Checkout A: SELECT usage_count → 2   (budget available!)           │
//! │     Checkout B: SELECT usage_count → 2   (budget available!)           │
//! │     Checkout A: UPDATE ... SET usage_count = 3                         │
//! │     Checkout B: UPDATE ... SET usage_count = 3   ← double-sold         │
//! │                                                                         │
//! │  ✅ CORRECT: conditional write, the row decides                        │
//! │     UPDATE discounts SET usage_count = usage_count + 1                 │
//! │     WHERE id = ? AND (usage_limit = 0 OR usage_count < usage_limit)    │
//! │                                                                         │
//! │     Checkout A: rows_affected = 1  → Reserved                          │
//! │     Checkout B: rows_affected = 0  → Rejected(GloballyExhausted)       │
//! │                                                                         │
//! │  The check and the increment are one statement, so no interleaving    │
//! │  can let two callers both observe "budget available" and both win.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Shape
//! A reservation touches up to three rows inside one SQLite transaction:
//! the global counter, the per-customer usage record, and the reservation
//! ledger. They move together or not at all. The ledger is what makes
//! `release` idempotent: a release with no outstanding reservation is a
//! no-op, so a double release can never drag counters below their
//! pre-reservation values.
//!
//! Works across process instances: the serialization point is the database
//! row, not an in-process lock.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use promo_core::{CustomerUsage, RejectionReason};

/// Ledger key for reservations made on anonymous walk-in sales.
///
/// NULL cannot take part in the (discount_id, customer_key) upsert, so
/// walk-ins share this sentinel row.
pub const WALK_IN_KEY: &str = "";

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a reservation attempt.
///
/// Budget exhaustion is an expected business outcome, not a fault, so it is
/// data rather than an error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// One usage unit was consumed.
    Reserved,
    /// Budget exhausted; nothing was mutated. Carries `GloballyExhausted`
    /// or `PerCustomerExhausted`.
    Rejected(RejectionReason),
}

impl ReserveOutcome {
    /// Whether the reservation succeeded.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved)
    }
}

/// Result of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// One outstanding reservation was returned to the budget.
    Released,
    /// No outstanding reservation for this (discount, customer); nothing
    /// was mutated.
    AlreadyReleased,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for atomic usage accounting.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: SqlitePool,
}

impl UsageRepository {
    /// Creates a new UsageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UsageRepository { pool }
    }

    /// Atomically reserves one usage unit for a discount.
    ///
    /// ## Algorithm
    /// One transaction:
    /// 1. Conditional increment of the global counter. Zero rows affected
    ///    means the budget is spent (or the discount is gone; step 2 tells
    ///    the two apart).
    /// 2. Read the static per-customer cap (configuration, not a counter,
    ///    so reading it is not the forbidden read-then-write).
    /// 3. For identified customers: conditional upsert of the usage record,
    ///    guarded by the cap. Zero rows affected rolls the whole
    ///    transaction back.
    /// 4. Ledger upsert recording the outstanding reservation.
    ///
    /// ## Returns
    /// * `Ok(ReserveOutcome::Reserved)` - budget consumed
    /// * `Ok(ReserveOutcome::Rejected(_))` - budget exhausted, no mutation
    /// * `Err(DbError::NotFound)` - no such discount
    pub async fn reserve(
        &self,
        discount_id: &str,
        customer_id: Option<&str>,
    ) -> DbResult<ReserveOutcome> {
        debug!(discount_id = %discount_id, customer_id = ?customer_id, "Reserving usage unit");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The authoritative global budget check: condition and increment in
        // one statement
        let global = sqlx::query(
            r#"
            UPDATE discounts
            SET usage_count = usage_count + 1, updated_at = ?2
            WHERE id = ?1 AND (usage_limit = 0 OR usage_count < usage_limit)
            "#,
        )
        .bind(discount_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Static cap, also doubling as the existence check
        let per_customer_cap: Option<i64> =
            sqlx::query_scalar("SELECT usage_per_customer FROM discounts WHERE id = ?1")
                .bind(discount_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(per_customer_cap) = per_customer_cap else {
            tx.rollback().await?;
            return Err(DbError::not_found("Discount", discount_id));
        };

        if global.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(discount_id = %discount_id, "Global budget exhausted");
            return Ok(ReserveOutcome::Rejected(RejectionReason::GloballyExhausted));
        }

        // Per-customer accounting: walk-ins have no identity to count
        if let Some(customer_id) = customer_id {
            let usage = if per_customer_cap > 0 {
                sqlx::query(
                    r#"
                    INSERT INTO discount_usages (discount_id, customer_id, redemption_count, updated_at)
                    VALUES (?1, ?2, 1, ?3)
                    ON CONFLICT(discount_id, customer_id) DO UPDATE SET
                        redemption_count = redemption_count + 1,
                        updated_at = excluded.updated_at
                    WHERE discount_usages.redemption_count < ?4
                    "#,
                )
                .bind(discount_id)
                .bind(customer_id)
                .bind(now)
                .bind(per_customer_cap)
                .execute(&mut *tx)
                .await?
            } else {
                // Unlimited per customer: still keep the record for
                // bookkeeping, unguarded
                sqlx::query(
                    r#"
                    INSERT INTO discount_usages (discount_id, customer_id, redemption_count, updated_at)
                    VALUES (?1, ?2, 1, ?3)
                    ON CONFLICT(discount_id, customer_id) DO UPDATE SET
                        redemption_count = redemption_count + 1,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(discount_id)
                .bind(customer_id)
                .bind(now)
                .execute(&mut *tx)
                .await?
            };

            if per_customer_cap > 0 && usage.rows_affected() == 0 {
                // Rolls back the global increment too: both or neither
                tx.rollback().await?;
                debug!(
                    discount_id = %discount_id,
                    customer_id = %customer_id,
                    "Per-customer budget exhausted"
                );
                return Ok(ReserveOutcome::Rejected(
                    RejectionReason::PerCustomerExhausted,
                ));
            }
        }

        // Ledger: one more outstanding reservation for this pair
        let key = customer_id.unwrap_or(WALK_IN_KEY);
        sqlx::query(
            r#"
            INSERT INTO discount_reservations (discount_id, customer_key, pending, updated_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(discount_id, customer_key) DO UPDATE SET
                pending = pending + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(discount_id)
        .bind(key)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(discount_id = %discount_id, "Usage unit reserved");
        Ok(ReserveOutcome::Reserved)
    }

    /// Releases one previously reserved usage unit (compensation for a
    /// checkout that failed after reservation, e.g. payment declined).
    ///
    /// ## Idempotence
    /// The ledger row is decremented first, guarded by `pending > 0`. When
    /// there is no outstanding reservation the release is a no-op: counters
    /// can never drop below their pre-reservation values, no matter how
    /// many times a compensation handler retries.
    pub async fn release(
        &self,
        discount_id: &str,
        customer_id: Option<&str>,
    ) -> DbResult<ReleaseOutcome> {
        debug!(discount_id = %discount_id, customer_id = ?customer_id, "Releasing usage unit");

        let now = Utc::now();
        let key = customer_id.unwrap_or(WALK_IN_KEY);
        let mut tx = self.pool.begin().await?;

        let ledger = sqlx::query(
            r#"
            UPDATE discount_reservations
            SET pending = pending - 1, updated_at = ?3
            WHERE discount_id = ?1 AND customer_key = ?2 AND pending > 0
            "#,
        )
        .bind(discount_id)
        .bind(key)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if ledger.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(discount_id = %discount_id, "No outstanding reservation, release is a no-op");
            return Ok(ReleaseOutcome::AlreadyReleased);
        }

        // The floors guard against counter drift; with an intact ledger they
        // never actually bind
        sqlx::query(
            r#"
            UPDATE discounts
            SET usage_count = usage_count - 1, updated_at = ?2
            WHERE id = ?1 AND usage_count > 0
            "#,
        )
        .bind(discount_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(customer_id) = customer_id {
            sqlx::query(
                r#"
                UPDATE discount_usages
                SET redemption_count = redemption_count - 1, updated_at = ?3
                WHERE discount_id = ?1 AND customer_id = ?2 AND redemption_count > 0
                "#,
            )
            .bind(discount_id)
            .bind(customer_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(discount_id = %discount_id, "Usage unit released");
        Ok(ReleaseOutcome::Released)
    }

    /// The customer's current redemption count for a discount.
    ///
    /// 0 when there is no usage record. Feeds the eligibility evaluator's
    /// per-customer pre-check.
    pub async fn customer_redemptions(
        &self,
        discount_id: &str,
        customer_id: &str,
    ) -> DbResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT redemption_count FROM discount_usages
            WHERE discount_id = ?1 AND customer_id = ?2
            "#,
        )
        .bind(discount_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    /// The full usage record, for diagnostics.
    pub async fn usage_record(
        &self,
        discount_id: &str,
        customer_id: &str,
    ) -> DbResult<Option<CustomerUsage>> {
        let record = sqlx::query_as::<_, CustomerUsage>(
            r#"
            SELECT discount_id, customer_id, redemption_count, updated_at
            FROM discount_usages
            WHERE discount_id = ?1 AND customer_id = ?2
            "#,
        )
        .bind(discount_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::discount::generate_discount_id;
    use promo_core::{Applicability, Discount, DiscountType};

    async fn db_with_discount(usage_limit: i64, usage_per_customer: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let discount = Discount {
            id: generate_discount_id(),
            code: Some("LIMITED".to_string()),
            name: "Limited".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 1_000,
            min_purchase: 0,
            max_discount: 0,
            applicable_to: Applicability::All,
            customer_id: None,
            store_id: None,
            is_automatic: false,
            usage_limit,
            usage_count: 0,
            usage_per_customer,
            start_date: None,
            end_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.discounts().insert(&discount).await.unwrap();
        (db, discount.id)
    }

    #[tokio::test]
    async fn test_unlimited_budget_always_reserves() {
        let (db, id) = db_with_discount(0, 0).await;
        let usage = db.usage();

        for _ in 0..10 {
            assert!(usage.reserve(&id, None).await.unwrap().is_reserved());
        }
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_last_ticket_goes_to_exactly_one() {
        let (db, id) = db_with_discount(1, 0).await;
        let usage = db.usage();

        let first = usage.reserve(&id, None).await.unwrap();
        let second = usage.reserve(&id, None).await.unwrap();

        assert_eq!(first, ReserveOutcome::Reserved);
        assert_eq!(
            second,
            ReserveOutcome::Rejected(RejectionReason::GloballyExhausted)
        );
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_respect_limit() {
        let (db, id) = db_with_discount(5, 0).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let usage = db.usage();
            let id = id.clone();
            handles.push(tokio::spawn(
                async move { usage.reserve(&id, None).await },
            ));
        }

        let mut reserved = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                ReserveOutcome::Reserved => reserved += 1,
                ReserveOutcome::Rejected(RejectionReason::GloballyExhausted) => rejected += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        // Exactly min(limit, attempts) succeed, the rest see exhaustion
        assert_eq!(reserved, 5);
        assert_eq!(rejected, 15);
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_per_customer_cap_rolls_back_global() {
        let (db, id) = db_with_discount(0, 1).await;
        let usage = db.usage();

        assert!(usage.reserve(&id, Some("c-1")).await.unwrap().is_reserved());

        let second = usage.reserve(&id, Some("c-1")).await.unwrap();
        assert_eq!(
            second,
            ReserveOutcome::Rejected(RejectionReason::PerCustomerExhausted)
        );

        // The rejected attempt must not have consumed global budget
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(1));
        assert_eq!(usage.customer_redemptions(&id, "c-1").await.unwrap(), 1);

        // A different customer still gets through
        assert!(usage.reserve(&id, Some("c-2")).await.unwrap().is_reserved());
    }

    #[tokio::test]
    async fn test_walk_in_reservations_skip_usage_records() {
        let (db, id) = db_with_discount(0, 0).await;
        let usage = db.usage();

        assert!(usage.reserve(&id, None).await.unwrap().is_reserved());
        assert!(usage.usage_record(&id, WALK_IN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_returns_budget() {
        let (db, id) = db_with_discount(1, 0).await;
        let usage = db.usage();

        assert!(usage.reserve(&id, None).await.unwrap().is_reserved());
        assert!(!usage.reserve(&id, None).await.unwrap().is_reserved());

        assert_eq!(
            usage.release(&id, None).await.unwrap(),
            ReleaseOutcome::Released
        );

        // The ticket is back
        assert!(usage.reserve(&id, None).await.unwrap().is_reserved());
    }

    #[tokio::test]
    async fn test_double_release_never_drops_below_pre_reservation() {
        // Seed a discount that has already been redeemed 3 times through
        // other checkouts (no outstanding reservations of ours)
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let id = generate_discount_id();
        let discount = Discount {
            id: id.clone(),
            code: Some("SEEDED".to_string()),
            name: "Seeded".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 1_000,
            min_purchase: 0,
            max_discount: 0,
            applicable_to: Applicability::All,
            customer_id: None,
            store_id: None,
            is_automatic: false,
            usage_limit: 0,
            usage_count: 3,
            usage_per_customer: 0,
            start_date: None,
            end_date: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.discounts().insert(&discount).await.unwrap();
        let usage = db.usage();

        usage.reserve(&id, None).await.unwrap();
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(4));

        assert_eq!(
            usage.release(&id, None).await.unwrap(),
            ReleaseOutcome::Released
        );
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(3));

        // Second release of the same reservation: no-op, the counter stays
        // at its pre-reservation value
        assert_eq!(
            usage.release(&id, None).await.unwrap(),
            ReleaseOutcome::AlreadyReleased
        );
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_release_without_reserve_is_a_noop() {
        let (db, id) = db_with_discount(0, 0).await;
        let usage = db.usage();

        assert_eq!(
            usage.release(&id, None).await.unwrap(),
            ReleaseOutcome::AlreadyReleased
        );
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_release_moves_both_counters() {
        let (db, id) = db_with_discount(0, 2).await;
        let usage = db.usage();

        usage.reserve(&id, Some("c-1")).await.unwrap();
        usage.reserve(&id, Some("c-1")).await.unwrap();
        assert_eq!(usage.customer_redemptions(&id, "c-1").await.unwrap(), 2);

        usage.release(&id, Some("c-1")).await.unwrap();
        assert_eq!(db.discounts().usage_count(&id).await.unwrap(), Some(1));
        assert_eq!(usage.customer_redemptions(&id, "c-1").await.unwrap(), 1);

        // The released unit is reservable again despite the cap of 2
        assert!(usage.reserve(&id, Some("c-1")).await.unwrap().is_reserved());
    }

    #[tokio::test]
    async fn test_reserve_unknown_discount_is_an_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.usage().reserve("no-such-id", None).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
