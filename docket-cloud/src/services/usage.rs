//! Usage metering and quota checks
//!
//! Failure polarity is deliberate and differs per operation:
//! reads fail open (unknown usage renders as zero, callers are not
//! blocked), increments fail open (the metered action has already
//! happened), quota checks fail closed (no unverified consumption),
//! and limit lookups always produce a catalog entry.

use std::sync::Arc;

use shared::models::{Metric, PlanLimits, PlanType, Subscription, UsageTotals};
use shared::util::now_millis;

use crate::db::{StoreResult, UsageStore};
use crate::services::fallback::{self, FallbackContext};

#[derive(Clone)]
pub struct UsageService {
    store: Arc<dyn UsageStore>,
}

impl UsageService {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// Usage totals plus effective limits for an account, for the
    /// account-facing summary endpoint. Never fails: an account
    /// without a resolvable subscription reads as zero usage on the
    /// free tier.
    pub async fn account_summary(&self, account_id: &str) -> (UsageTotals, PlanLimits) {
        match self.store.active_subscription(account_id).await {
            Ok(Some(sub)) => {
                let limits = limits_for_plan(&sub.plan);
                let usage = self.current_usage(&sub).await;
                (usage, limits)
            }
            Ok(None) => (UsageTotals::new(), PlanLimits::free_tier()),
            Err(err) => {
                tracing::warn!(
                    account_id,
                    error = %err,
                    "Subscription lookup failed, treating usage as unknown"
                );
                (UsageTotals::new(), PlanLimits::free_tier())
            }
        }
    }

    /// All current-period counters for a subscription.
    ///
    /// Fails open: any store failure is logged and rendered as an
    /// empty map, which callers display as zero usage.
    pub async fn current_usage(&self, subscription: &Subscription) -> UsageTotals {
        let (period_start, _) = subscription.billing_period(now_millis());
        let result = fallback::execute(
            self.store.current_usage(&subscription.id),
            || self.store.list_counters(&subscription.id, period_start),
            FallbackContext {
                operation: "get_current_usage",
                target: &subscription.id,
            },
        )
        .await;

        match result {
            Ok(rows) => rows.into_iter().collect(),
            Err(err) => {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    error = %err,
                    "Usage read failed, treating usage as unknown"
                );
                UsageTotals::new()
            }
        }
    }

    /// Record consumption of `quantity` units of `metric`.
    ///
    /// Best effort: the metered action has already succeeded by the
    /// time this runs, so failures are logged and swallowed. An
    /// account without an active subscription is simply not metered.
    pub async fn increment_usage(&self, account_id: &str, metric: Metric, quantity: i64) {
        if let Err(err) = self.try_increment(account_id, metric, quantity).await {
            tracing::warn!(
                account_id,
                metric = metric.as_str(),
                quantity,
                error = %err,
                "Usage increment dropped"
            );
        }
    }

    async fn try_increment(
        &self,
        account_id: &str,
        metric: Metric,
        quantity: i64,
    ) -> StoreResult<()> {
        let Some(sub) = self.store.active_subscription(account_id).await? else {
            return Ok(());
        };
        let (period_start, period_end) = sub.billing_period(now_millis());
        let sub_id = sub.id.as_str();

        fallback::execute(
            self.store.increment_usage(sub_id, metric, quantity),
            || async move {
                // Read-modify-write: concurrent increments in this
                // window can undercount. Accepted for deployments
                // still missing the atomic procedure.
                let current = self
                    .store
                    .read_counter(sub_id, metric, period_start)
                    .await?
                    .unwrap_or(0);
                self.store
                    .write_counter(sub_id, metric, current + quantity, period_start, period_end)
                    .await
            },
            FallbackContext {
                operation: "increment_usage",
                target: sub_id,
            },
        )
        .await
    }

    /// Decide whether the account may consume `required` more units.
    ///
    /// Fails closed: when the answer cannot be computed the request
    /// is denied.
    pub async fn check_quota(&self, account_id: &str, metric: Metric, required: i64) -> bool {
        let result = fallback::execute(
            self.store.check_quota(account_id, metric, required),
            || self.check_quota_degraded(account_id, metric, required),
            FallbackContext {
                operation: "check_quota",
                target: account_id,
            },
        )
        .await;

        match result {
            Ok(allowed) => allowed,
            Err(err) => {
                tracing::warn!(
                    account_id,
                    metric = metric.as_str(),
                    required,
                    error = %err,
                    "Quota check failed, denying request"
                );
                false
            }
        }
    }

    /// Client-side quota resolution for schemas without `check_quota`
    async fn check_quota_degraded(
        &self,
        account_id: &str,
        metric: Metric,
        required: i64,
    ) -> StoreResult<bool> {
        let (limits, current) = match self.store.active_subscription(account_id).await? {
            Some(sub) => {
                let (period_start, _) = sub.billing_period(now_millis());
                let current = self
                    .store
                    .read_counter(&sub.id, metric, period_start)
                    .await?
                    .unwrap_or(0);
                (limits_for_plan(&sub.plan), current)
            }
            None => (PlanLimits::free_tier(), 0),
        };
        Ok(limits.allows(metric, current, required))
    }

    /// Effective plan limits for an account. Never fails: accounts
    /// without a subscription, unknown plan names and lookup errors
    /// all resolve to the free tier.
    pub async fn effective_limits(&self, account_id: &str) -> PlanLimits {
        match self.store.active_subscription(account_id).await {
            Ok(Some(sub)) => limits_for_plan(&sub.plan),
            Ok(None) => PlanLimits::free_tier(),
            Err(err) => {
                tracing::warn!(
                    account_id,
                    error = %err,
                    "Subscription lookup failed, assuming free tier limits"
                );
                PlanLimits::free_tier()
            }
        }
    }
}

fn limits_for_plan(plan: &str) -> PlanLimits {
    match PlanType::from_db(plan) {
        Some(plan) => PlanLimits::from_plan(plan),
        None => {
            tracing::warn!(plan, "Unrecognized plan, applying free tier limits");
            PlanLimits::free_tier()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::models::SubscriptionStatus;
    use shared::util::month_bounds_millis;

    use crate::db::{MemoryStore, StoreError};

    /// Store whose backend is unreachable
    struct FailingStore;

    fn offline() -> StoreError {
        StoreError::Backend("database offline".into())
    }

    #[async_trait]
    impl UsageStore for FailingStore {
        async fn active_subscription(&self, _: &str) -> StoreResult<Option<Subscription>> {
            Err(offline())
        }
        async fn increment_usage(&self, _: &str, _: Metric, _: i64) -> StoreResult<()> {
            Err(offline())
        }
        async fn check_quota(&self, _: &str, _: Metric, _: i64) -> StoreResult<bool> {
            Err(offline())
        }
        async fn current_usage(&self, _: &str) -> StoreResult<Vec<(Metric, i64)>> {
            Err(offline())
        }
        async fn read_counter(&self, _: &str, _: Metric, _: i64) -> StoreResult<Option<i64>> {
            Err(offline())
        }
        async fn write_counter(&self, _: &str, _: Metric, _: i64, _: i64, _: i64) -> StoreResult<()> {
            Err(offline())
        }
        async fn list_counters(&self, _: &str, _: i64) -> StoreResult<Vec<(Metric, i64)>> {
            Err(offline())
        }
    }

    fn subscription(id: &str, account_id: &str, plan: &str) -> Subscription {
        Subscription {
            id: id.to_string(),
            account_id: account_id.to_string(),
            plan: plan.to_string(),
            status: SubscriptionStatus::Active,
            current_period_start: None,
            current_period_end: None,
            created_at: now_millis(),
        }
    }

    fn memory_service(store: MemoryStore) -> (UsageService, Arc<MemoryStore>) {
        let store = Arc::new(store);
        (UsageService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_usage_read_fails_open() {
        let service = UsageService::new(Arc::new(FailingStore));
        let usage = service.current_usage(&subscription("sub-1", "acct-1", "pro")).await;
        assert!(usage.is_empty());
    }

    #[tokio::test]
    async fn test_account_summary_fails_open_to_free_tier() {
        let service = UsageService::new(Arc::new(FailingStore));
        let (usage, limits) = service.account_summary("acct-1").await;
        assert!(usage.is_empty());
        assert_eq!(limits, PlanLimits::free_tier());
    }

    #[tokio::test]
    async fn test_increment_store_failure_is_swallowed() {
        let service = UsageService::new(Arc::new(FailingStore));
        // Must not panic or surface the error
        service.increment_usage("acct-1", Metric::AiRequests, 1).await;
    }

    #[tokio::test]
    async fn test_increment_without_subscription_is_noop() {
        let (service, store) = memory_service(MemoryStore::new());
        service.increment_usage("acct-1", Metric::Cases, 1).await;

        let (period_start, _) = month_bounds_millis(now_millis());
        let counters = store.list_counters("sub-1", period_start).await.unwrap();
        assert!(counters.is_empty());
    }

    #[tokio::test]
    async fn test_increment_and_read_via_atomic_ops() {
        let (service, store) = memory_service(MemoryStore::new());
        let sub = subscription("sub-1", "acct-1", "pro");
        store.insert_subscription(sub.clone());

        service.increment_usage("acct-1", Metric::AiRequests, 2).await;
        service.increment_usage("acct-1", Metric::AiRequests, 3).await;

        let usage = service.current_usage(&sub).await;
        assert_eq!(usage.get(&Metric::AiRequests), Some(&5));
    }

    #[tokio::test]
    async fn test_degraded_increment_accumulates() {
        let (service, store) = memory_service(MemoryStore::without_atomic_ops());
        let sub = subscription("sub-1", "acct-1", "pro");
        store.insert_subscription(sub.clone());

        service.increment_usage("acct-1", Metric::Cases, 1).await;
        service.increment_usage("acct-1", Metric::Cases, 1).await;

        let usage = service.current_usage(&sub).await;
        assert_eq!(usage.get(&Metric::Cases), Some(&2));
    }

    #[tokio::test]
    async fn test_check_quota_fails_closed() {
        let service = UsageService::new(Arc::new(FailingStore));
        assert!(!service.check_quota("acct-1", Metric::Cases, 1).await);
    }

    #[tokio::test]
    async fn test_check_quota_degraded_resolution() {
        let (service, store) = memory_service(MemoryStore::without_atomic_ops());
        store.insert_subscription(subscription("sub-1", "acct-1", "free"));

        // Free tier allows 3 cases
        assert!(service.check_quota("acct-1", Metric::Cases, 3).await);
        assert!(!service.check_quota("acct-1", Metric::Cases, 4).await);
    }

    #[tokio::test]
    async fn test_check_quota_without_subscription_uses_free_tier() {
        let (service, _store) = memory_service(MemoryStore::new());
        assert!(service.check_quota("acct-1", Metric::StorageGb, 1).await);
        assert!(!service.check_quota("acct-1", Metric::StorageGb, 2).await);
    }

    #[tokio::test]
    async fn test_effective_limits_for_plans() {
        let (service, store) = memory_service(MemoryStore::new());
        store.insert_subscription(subscription("sub-1", "acct-1", "pro"));

        let limits = service.effective_limits("acct-1").await;
        assert_eq!(limits.max_cases, 50);

        // No subscription resolves to free tier
        let limits = service.effective_limits("acct-2").await;
        assert_eq!(limits, PlanLimits::free_tier());
    }

    #[tokio::test]
    async fn test_unknown_plan_falls_back_to_free_tier() {
        let (service, store) = memory_service(MemoryStore::new());
        store.insert_subscription(subscription("sub-1", "acct-1", "enterprise"));

        let limits = service.effective_limits("acct-1").await;
        assert_eq!(limits, PlanLimits::free_tier());
    }

    #[tokio::test]
    async fn test_effective_limits_fails_open_to_free_tier() {
        let service = UsageService::new(Arc::new(FailingStore));
        let limits = service.effective_limits("acct-1").await;
        assert_eq!(limits, PlanLimits::free_tier());
    }
}
