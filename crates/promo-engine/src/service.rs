//! # Validation Service
//!
//! Orchestrates record resolution, eligibility, amount computation, and
//! usage reservation into the single externally-visible `validate`
//! operation.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    validate(request)                                    │
//! │                                                                         │
//! │  1. Resolve record by code or id ──────────► not_found                 │
//! │       │                                                                 │
//! │  2. Definition coherence check ────────────► EngineError (fault)       │
//! │       │                                                                 │
//! │  3. Eligibility (pure, ordered) ───────────► inactive / expired / ...  │
//! │       │                                                                 │
//! │  4. Amount (pure) ─── preview? ────────────► valid, no mutation        │
//! │       │                                                                 │
//! │  5. Reserve under deadline ────────────────► globally_exhausted /      │
//! │       │                                      per_customer_exhausted /  │
//! │       │                                      temporarily_unavailable   │
//! │       ▼                                                                 │
//! │  6. valid = true, snapshot + amount                                    │
//! │                                                                         │
//! │  The reservation's rejection is authoritative: budget can vanish      │
//! │  between step 3's pre-check and step 5 under concurrency, and the     │
//! │  conditional write decides who got the last ticket.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use promo_core::eligibility::{self, EvaluationContext};
use promo_core::validation::validate_definition;
use promo_core::{
    amount, Discount, DiscountSnapshot, Money, RejectionReason, ValidationOutcome,
    ValidationRequest,
};
use promo_db::{Database, ReleaseOutcome, ReserveOutcome};

use crate::config::EngineConfig;
use crate::error::EngineResult;

// =============================================================================
// Validation Service
// =============================================================================

/// The discount engine's externally-visible operation surface.
///
/// ## Usage
/// ```rust,ignore
/// let service = ValidationService::new(db);
///
/// // UI feedback while building a cart: never consumes budget
/// let preview = service
///     .validate(&ValidationRequest::preview("WELCOME10", 150_000))
///     .await?;
///
/// // Sale finalization: reserves one usage unit atomically
/// let outcome = service
///     .validate(&ValidationRequest::committing("WELCOME10", 150_000))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ValidationService {
    db: Database,
    reserve_timeout: Duration,
}

impl ValidationService {
    /// Creates a service with the default reserve deadline.
    pub fn new(db: Database) -> Self {
        ValidationService {
            db,
            reserve_timeout: EngineConfig::default().reserve_timeout(),
        }
    }

    /// Creates a service with an explicit reserve deadline.
    pub fn with_reserve_timeout(db: Database, reserve_timeout: Duration) -> Self {
        ValidationService {
            db,
            reserve_timeout,
        }
    }

    /// Builds the database connection and the service from configuration.
    pub async fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let db = Database::new(promo_db::DbConfig::new(&config.database_path)).await?;
        Ok(ValidationService::with_reserve_timeout(
            db,
            config.reserve_timeout(),
        ))
    }

    /// Validates a discount against a candidate sale.
    ///
    /// Preview requests never mutate anything. Committing requests consume
    /// one usage unit on success; on any rejection, nothing was mutated.
    pub async fn validate(&self, request: &ValidationRequest) -> EngineResult<ValidationOutcome> {
        let now = Utc::now();

        debug!(
            code_or_id = %request.code_or_id,
            preview = request.preview,
            cart_amount = request.cart_amount,
            "Validating discount"
        );

        // 1. Resolve the record
        let Some(discount) = self.db.discounts().resolve(&request.code_or_id).await? else {
            debug!(code_or_id = %request.code_or_id, "No matching discount");
            return Ok(ValidationOutcome::rejected(RejectionReason::NotFound));
        };

        // 2. Refuse corrupted definitions instead of evaluating them
        if let Err(err) = validate_definition(&discount) {
            warn!(discount_id = %discount.id, error = %err, "Refusing malformed definition");
            return Err(err.into());
        }

        // 3. Eligibility: first failure wins, no mutation on any path
        let ctx = self.resolve_facts(&discount, request).await?;
        if let Err(reason) = eligibility::evaluate(&discount, &ctx, now) {
            debug!(discount_id = %discount.id, reason = %reason, "Ineligible");
            return Ok(ValidationOutcome::rejected(reason));
        }

        // 4. Amount
        let cart = Money::from_units(request.cart_amount);
        let saved = amount::compute(&discount, cart);

        // 5. Committing requests reserve; the conditional write is the
        //    authoritative budget decision
        if !request.preview {
            if let Some(reason) = self
                .reserve_with_deadline(&discount.id, request.customer_id.as_deref())
                .await?
            {
                return Ok(ValidationOutcome::rejected(reason));
            }
            info!(
                discount_id = %discount.id,
                amount = %saved,
                "Discount committed"
            );
        }

        Ok(ValidationOutcome::approved(
            DiscountSnapshot::from(&discount),
            saved,
        ))
    }

    /// Releases a previously committed reservation (compensation for a
    /// checkout that failed after validation, e.g. payment declined or the
    /// sale was cancelled).
    ///
    /// Idempotent: releasing more times than was reserved is a no-op.
    pub async fn release(
        &self,
        code_or_id: &str,
        customer_id: Option<&str>,
    ) -> EngineResult<ReleaseOutcome> {
        let Some(discount) = self.db.discounts().resolve(code_or_id).await? else {
            return Err(promo_db::DbError::not_found("Discount", code_or_id).into());
        };

        let outcome = self
            .db
            .usage()
            .release(&discount.id, customer_id)
            .await?;

        info!(discount_id = %discount.id, outcome = ?outcome, "Release processed");
        Ok(outcome)
    }

    /// Lists currently-eligible automatic discounts for a candidate sale,
    /// best savings first.
    ///
    /// Preview semantics: never consumes budget, safe to call on every cart
    /// change. A malformed definition is skipped rather than failing the
    /// whole listing.
    pub async fn automatic_discounts(
        &self,
        customer_id: Option<&str>,
        store_id: Option<&str>,
        cart_amount: i64,
    ) -> EngineResult<Vec<ValidationOutcome>> {
        let now = Utc::now();
        let candidates = self.db.discounts().list_automatic().await?;

        debug!(count = candidates.len(), "Scanning automatic discounts");

        let mut outcomes = Vec::new();
        for discount in &candidates {
            if let Err(err) = validate_definition(discount) {
                warn!(discount_id = %discount.id, error = %err, "Skipping malformed definition");
                continue;
            }

            let request = ValidationRequest {
                code_or_id: discount.id.clone(),
                customer_id: customer_id.map(str::to_string),
                store_id: store_id.map(str::to_string),
                cart_amount,
                preview: true,
            };
            let ctx = self.resolve_facts(discount, &request).await?;

            if eligibility::evaluate(discount, &ctx, now).is_ok() {
                let saved = amount::compute(discount, Money::from_units(cart_amount));
                outcomes.push(ValidationOutcome::approved(
                    DiscountSnapshot::from(discount),
                    saved,
                ));
            }
        }

        // Best value first so the POS surface can offer the top one
        outcomes.sort_by_key(|o| std::cmp::Reverse(o.discount_amount.unwrap_or(0)));
        Ok(outcomes)
    }

    /// Resolves the contextual facts eligibility needs: the customer's
    /// member status and their redemption count for this discount.
    async fn resolve_facts<'a>(
        &self,
        discount: &Discount,
        request: &'a ValidationRequest,
    ) -> EngineResult<EvaluationContext<'a>> {
        let (customer_is_member, customer_redemptions) = match request.customer_id.as_deref() {
            Some(customer_id) => {
                // An unknown customer id is treated as a non-member, not an
                // error: eligibility produces the precise reason
                let is_member = self
                    .db
                    .customers()
                    .get_by_id(customer_id)
                    .await?
                    .map(|c| c.is_member)
                    .unwrap_or(false);

                let redemptions = if discount.usage_per_customer > 0 {
                    self.db
                        .usage()
                        .customer_redemptions(&discount.id, customer_id)
                        .await?
                } else {
                    0
                };

                (is_member, redemptions)
            }
            None => (false, 0),
        };

        Ok(EvaluationContext {
            customer_id: request.customer_id.as_deref(),
            store_id: request.store_id.as_deref(),
            cart_amount: Money::from_units(request.cart_amount),
            customer_is_member,
            customer_redemptions,
        })
    }

    /// Runs the atomic reservation under the configured deadline.
    ///
    /// Returns `None` on success, `Some(reason)` when the caller should see
    /// a rejection. A deadline expiry cancels the reservation future, which
    /// rolls its transaction back: timeouts never leave half-applied state.
    async fn reserve_with_deadline(
        &self,
        discount_id: &str,
        customer_id: Option<&str>,
    ) -> EngineResult<Option<RejectionReason>> {
        let usage = self.db.usage();
        let reserve = usage.reserve(discount_id, customer_id);

        match tokio::time::timeout(self.reserve_timeout, reserve).await {
            Err(_) => {
                warn!(discount_id = %discount_id, "Reservation deadline expired");
                Ok(Some(RejectionReason::TemporarilyUnavailable))
            }
            Ok(Err(err)) if err.is_contention() => {
                warn!(discount_id = %discount_id, error = %err, "Reservation contention");
                Ok(Some(RejectionReason::TemporarilyUnavailable))
            }
            Ok(Err(err)) => Err(err.into()),
            Ok(Ok(ReserveOutcome::Rejected(reason))) => Ok(Some(reason)),
            Ok(Ok(ReserveOutcome::Reserved)) => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::{Applicability, Customer, DiscountType};
    use promo_db::DbConfig;
    use uuid::Uuid;

    async fn service() -> ValidationService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        ValidationService::new(db)
    }

    fn discount(code: Option<&str>) -> Discount {
        let now = Utc::now();
        Discount {
            id: Uuid::new_v4().to_string(),
            code: code.map(str::to_string),
            name: "Test".to_string(),
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

    async fn insert(svc: &ValidationService, d: &Discount) {
        svc.db.discounts().insert(d).await.unwrap();
    }

    async fn insert_customer(svc: &ValidationService, id: &str, is_member: bool) {
        svc.db
            .customers()
            .insert(&Customer {
                id: id.to_string(),
                name: "Test Customer".to_string(),
                is_member,
            })
            .await
            .unwrap();
    }

    async fn usage_count(svc: &ValidationService, id: &str) -> i64 {
        svc.db.discounts().usage_count(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let svc = service().await;
        let outcome = svc
            .validate(&ValidationRequest::preview("NOPE", 10_000))
            .await
            .unwrap();

        assert!(!outcome.valid);
        assert_eq!(outcome.error_code, Some(RejectionReason::NotFound));
    }

    #[tokio::test]
    async fn test_preview_never_consumes_budget() {
        let svc = service().await;
        let mut d = discount(Some("LIMITED"));
        d.usage_limit = 1;
        insert(&svc, &d).await;

        for _ in 0..5 {
            let outcome = svc
                .validate(&ValidationRequest::preview("LIMITED", 10_000))
                .await
                .unwrap();
            assert!(outcome.valid);
        }

        assert_eq!(usage_count(&svc, &d.id).await, 0);
    }

    #[tokio::test]
    async fn test_committing_consumes_budget() {
        let svc = service().await;
        let mut d = discount(Some("LIMITED"));
        d.usage_limit = 1;
        insert(&svc, &d).await;

        let first = svc
            .validate(&ValidationRequest::committing("LIMITED", 10_000))
            .await
            .unwrap();
        assert!(first.valid);
        assert_eq!(usage_count(&svc, &d.id).await, 1);

        // Eligibility's pre-check already reports the exhaustion
        let second = svc
            .validate(&ValidationRequest::committing("LIMITED", 10_000))
            .await
            .unwrap();
        assert!(!second.valid);
        assert_eq!(
            second.error_code,
            Some(RejectionReason::GloballyExhausted)
        );
        assert_eq!(usage_count(&svc, &d.id).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_simultaneous_commits_one_ticket() {
        let svc = service().await;
        let mut d = discount(Some("LASTONE"));
        d.usage_limit = 1;
        insert(&svc, &d).await;

        let a = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.validate(&ValidationRequest::committing("LASTONE", 10_000))
                    .await
                    .unwrap()
            })
        };
        let b = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.validate(&ValidationRequest::committing("LASTONE", 10_000))
                    .await
                    .unwrap()
            })
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // Exactly one wins the last ticket
        assert_eq!(a.valid as u8 + b.valid as u8, 1);
        let loser = if a.valid { &b } else { &a };
        assert_eq!(
            loser.error_code,
            Some(RejectionReason::GloballyExhausted)
        );
        assert_eq!(usage_count(&svc, &d.id).await, 1);
    }

    #[tokio::test]
    async fn test_capped_percentage_boundary() {
        let svc = service().await;
        let mut d = discount(Some("BIG"));
        d.discount_value = 10;
        d.min_purchase = 50_000;
        d.max_discount = 20_000;
        insert(&svc, &d).await;

        // 10% of 200,000 = 20,000, capped at exactly 20,000
        let outcome = svc
            .validate(&ValidationRequest::preview("BIG", 200_000))
            .await
            .unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.discount_amount, Some(20_000));

        // Under the minimum purchase
        let outcome = svc
            .validate(&ValidationRequest::preview("BIG", 40_000))
            .await
            .unwrap();
        assert_eq!(
            outcome.error_code,
            Some(RejectionReason::BelowMinimumPurchase)
        );
    }

    #[tokio::test]
    async fn test_fixed_discount_clamps_to_cart() {
        let svc = service().await;
        let mut d = discount(Some("FIXED15K"));
        d.discount_type = DiscountType::Fixed;
        d.discount_value = 15_000;
        insert(&svc, &d).await;

        let outcome = svc
            .validate(&ValidationRequest::preview("FIXED15K", 10_000))
            .await
            .unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.discount_amount, Some(10_000));
    }

    #[tokio::test]
    async fn test_member_discount_rejects_non_member() {
        let svc = service().await;
        let mut d = discount(Some("MEMBERS"));
        d.applicable_to = Applicability::Member;
        insert(&svc, &d).await;
        insert_customer(&svc, "c-nonmember", false).await;
        insert_customer(&svc, "c-member", true).await;

        // Non-member customer, regardless of cart amount
        let outcome = svc
            .validate(
                &ValidationRequest::preview("MEMBERS", 9_999_999).with_customer("c-nonmember"),
            )
            .await
            .unwrap();
        assert_eq!(outcome.error_code, Some(RejectionReason::NotMember));

        // Walk-in fails too
        let outcome = svc
            .validate(&ValidationRequest::preview("MEMBERS", 10_000))
            .await
            .unwrap();
        assert_eq!(outcome.error_code, Some(RejectionReason::NotMember));

        // Member passes
        let outcome = svc
            .validate(&ValidationRequest::preview("MEMBERS", 10_000).with_customer("c-member"))
            .await
            .unwrap();
        assert!(outcome.valid);
    }

    #[tokio::test]
    async fn test_specific_customer_mismatch() {
        let svc = service().await;
        let mut d = discount(Some("PERSONAL"));
        d.applicable_to = Applicability::SpecificCustomer;
        d.customer_id = Some("42".to_string());
        insert(&svc, &d).await;
        insert_customer(&svc, "7", true).await;

        let outcome = svc
            .validate(&ValidationRequest::preview("PERSONAL", 10_000).with_customer("7"))
            .await
            .unwrap();
        assert_eq!(
            outcome.error_code,
            Some(RejectionReason::CustomerMismatch)
        );
    }

    #[tokio::test]
    async fn test_expired_discount_rejected() {
        let svc = service().await;
        let mut d = discount(Some("OLD"));
        d.end_date = Some(Utc::now() - chrono::Duration::days(2));
        insert(&svc, &d).await;

        let outcome = svc
            .validate(&ValidationRequest::preview("OLD", 10_000))
            .await
            .unwrap();
        assert_eq!(outcome.error_code, Some(RejectionReason::Expired));
    }

    #[tokio::test]
    async fn test_per_customer_cap_enforced_end_to_end() {
        let svc = service().await;
        let mut d = discount(Some("ONCE"));
        d.usage_per_customer = 1;
        insert(&svc, &d).await;
        insert_customer(&svc, "c-1", false).await;

        let first = svc
            .validate(&ValidationRequest::committing("ONCE", 10_000).with_customer("c-1"))
            .await
            .unwrap();
        assert!(first.valid);

        let second = svc
            .validate(&ValidationRequest::committing("ONCE", 10_000).with_customer("c-1"))
            .await
            .unwrap();
        assert_eq!(
            second.error_code,
            Some(RejectionReason::PerCustomerExhausted)
        );

        // The cap is per customer, not global
        insert_customer(&svc, "c-2", false).await;
        let other = svc
            .validate(&ValidationRequest::committing("ONCE", 10_000).with_customer("c-2"))
            .await
            .unwrap();
        assert!(other.valid);
    }

    #[tokio::test]
    async fn test_release_returns_the_ticket() {
        let svc = service().await;
        let mut d = discount(Some("TICKET"));
        d.usage_limit = 1;
        insert(&svc, &d).await;

        let outcome = svc
            .validate(&ValidationRequest::committing("TICKET", 10_000))
            .await
            .unwrap();
        assert!(outcome.valid);

        // Payment declined: the caller compensates
        assert_eq!(
            svc.release("TICKET", None).await.unwrap(),
            ReleaseOutcome::Released
        );
        // A retried release is a no-op
        assert_eq!(
            svc.release("TICKET", None).await.unwrap(),
            ReleaseOutcome::AlreadyReleased
        );
        assert_eq!(usage_count(&svc, &d.id).await, 0);

        // The ticket is sellable again
        let outcome = svc
            .validate(&ValidationRequest::committing("TICKET", 10_000))
            .await
            .unwrap();
        assert!(outcome.valid);
    }

    #[tokio::test]
    async fn test_automatic_discounts_listing() {
        let svc = service().await;
        insert_customer(&svc, "c-member", true).await;

        let mut small = discount(None);
        small.name = "Member 5%".to_string();
        small.discount_value = 5;
        small.applicable_to = Applicability::Member;
        small.is_automatic = true;
        insert(&svc, &small).await;

        let mut big = discount(None);
        big.name = "Member 15%".to_string();
        big.discount_value = 15;
        big.applicable_to = Applicability::Member;
        big.is_automatic = true;
        insert(&svc, &big).await;

        // A coded, non-automatic discount must not appear
        insert(&svc, &discount(Some("CODED"))).await;

        let offers = svc
            .automatic_discounts(Some("c-member"), None, 100_000)
            .await
            .unwrap();

        assert_eq!(offers.len(), 2);
        // Best value first
        assert_eq!(offers[0].discount_amount, Some(15_000));
        assert_eq!(offers[1].discount_amount, Some(5_000));

        // A walk-in sees no member pricing
        let offers = svc.automatic_discounts(None, None, 100_000).await.unwrap();
        assert!(offers.is_empty());
    }

    #[tokio::test]
    async fn test_outcome_wire_shape() {
        let svc = service().await;
        insert(&svc, &discount(Some("WIRE"))).await;

        let outcome = svc
            .validate(&ValidationRequest::preview("WIRE", 10_000))
            .await
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["discount_amount"], 1_000);
        assert_eq!(json["discount"]["code"], "WIRE");
        assert!(json.get("error_code").is_none());

        let outcome = svc
            .validate(&ValidationRequest::preview("MISSING", 10_000))
            .await
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error_code"], "not_found");
        assert!(json.get("discount").is_none());
    }

    #[tokio::test]
    async fn test_malformed_definition_is_a_fault() {
        let svc = service().await;
        let mut d = discount(Some("BROKEN"));
        d.discount_value = 150; // percentage over 100
        insert(&svc, &d).await;

        let err = svc
            .validate(&ValidationRequest::preview("BROKEN", 10_000))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Definition(_)));
    }

    #[tokio::test]
    async fn test_code_match_is_case_insensitive_end_to_end() {
        let svc = service().await;
        insert(&svc, &discount(Some("WELCOME10"))).await;

        let outcome = svc
            .validate(&ValidationRequest::preview("welcome10", 10_000))
            .await
            .unwrap();
        assert!(outcome.valid);
    }
}
