//! In-memory store for tests and local development
//!
//! Behaves like the PostgreSQL store, including its atomic
//! procedures. [`MemoryStore::without_atomic_ops`] builds a store
//! whose schema predates those procedures: every atomic call fails as
//! unavailable, which forces callers onto their degraded paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};

use shared::models::{Message, MetadataPatch, Metric, PlanLimits, PlanType, Subscription};
use shared::util::now_millis;

use super::{MessageStore, StoreError, StoreResult, UsageStore};

/// (subscription_id, metric, period_start)
type CounterKey = (String, Metric, i64);

#[derive(Default)]
struct Inner {
    subscriptions: Vec<Subscription>,
    counters: BTreeMap<CounterKey, i64>,
    messages: HashMap<String, Message>,
}

impl Inner {
    fn subscription(&self, id: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.id == id)
    }

    fn active_subscription(&self, account_id: &str) -> Option<&Subscription> {
        self.subscriptions
            .iter()
            .filter(|s| s.account_id == account_id && s.status.is_active())
            .max_by_key(|s| s.created_at)
    }
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    atomic_ops: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            atomic_ops: true,
        }
    }

    /// Store without the atomic procedures installed
    pub fn without_atomic_ops() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            atomic_ops: false,
        }
    }

    pub fn insert_subscription(&self, subscription: Subscription) {
        self.lock().subscriptions.push(subscription);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn require_atomic(&self, procedure: &str) -> StoreResult<()> {
        if self.atomic_ops {
            Ok(())
        } else {
            Err(StoreError::ProcedureUnavailable {
                procedure: procedure.to_string(),
            })
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn limits_for(plan: &str) -> PlanLimits {
    PlanType::from_db(plan)
        .map(PlanLimits::from_plan)
        .unwrap_or_else(PlanLimits::free_tier)
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn active_subscription(&self, account_id: &str) -> StoreResult<Option<Subscription>> {
        Ok(self.lock().active_subscription(account_id).cloned())
    }

    async fn increment_usage(
        &self,
        subscription_id: &str,
        metric: Metric,
        quantity: i64,
    ) -> StoreResult<()> {
        self.require_atomic("increment_usage")?;
        let mut inner = self.lock();
        let (period_start, _) = inner
            .subscription(subscription_id)
            .ok_or(StoreError::NotFound)?
            .billing_period(now_millis());
        let key = (subscription_id.to_string(), metric, period_start);
        *inner.counters.entry(key).or_insert(0) += quantity;
        Ok(())
    }

    async fn check_quota(
        &self,
        account_id: &str,
        metric: Metric,
        required: i64,
    ) -> StoreResult<bool> {
        self.require_atomic("check_quota")?;
        let inner = self.lock();
        // Same resolution the stored procedure performs: no active
        // subscription means free tier with zero recorded usage
        let (limits, current) = match inner.active_subscription(account_id) {
            Some(sub) => {
                let (period_start, _) = sub.billing_period(now_millis());
                let key = (sub.id.clone(), metric, period_start);
                let current = inner.counters.get(&key).copied().unwrap_or(0);
                (limits_for(&sub.plan), current)
            }
            None => (PlanLimits::free_tier(), 0),
        };
        Ok(limits.allows(metric, current, required))
    }

    async fn current_usage(&self, subscription_id: &str) -> StoreResult<Vec<(Metric, i64)>> {
        self.require_atomic("get_current_usage")?;
        let inner = self.lock();
        let (period_start, _) = inner
            .subscription(subscription_id)
            .ok_or(StoreError::NotFound)?
            .billing_period(now_millis());
        Ok(collect_counters(&inner.counters, subscription_id, period_start))
    }

    async fn read_counter(
        &self,
        subscription_id: &str,
        metric: Metric,
        period_start: i64,
    ) -> StoreResult<Option<i64>> {
        let key = (subscription_id.to_string(), metric, period_start);
        Ok(self.lock().counters.get(&key).copied())
    }

    async fn write_counter(
        &self,
        subscription_id: &str,
        metric: Metric,
        quantity: i64,
        period_start: i64,
        _period_end: i64,
    ) -> StoreResult<()> {
        let key = (subscription_id.to_string(), metric, period_start);
        self.lock().counters.insert(key, quantity);
        Ok(())
    }

    async fn list_counters(
        &self,
        subscription_id: &str,
        period_start: i64,
    ) -> StoreResult<Vec<(Metric, i64)>> {
        Ok(collect_counters(
            &self.lock().counters,
            subscription_id,
            period_start,
        ))
    }
}

fn collect_counters(
    counters: &BTreeMap<CounterKey, i64>,
    subscription_id: &str,
    period_start: i64,
) -> Vec<(Metric, i64)> {
    counters
        .iter()
        .filter(|((sub, _, start), _)| sub == subscription_id && *start == period_start)
        .map(|((_, metric, _), quantity)| (*metric, *quantity))
        .collect()
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, message: &Message) -> StoreResult<()> {
        self.lock()
            .messages
            .insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn find_message(&self, id: &str) -> StoreResult<Option<Message>> {
        Ok(self.lock().messages.get(id).cloned())
    }

    async fn merge_message(
        &self,
        id: &str,
        content: Option<&str>,
        patch: Option<&MetadataPatch>,
    ) -> StoreResult<()> {
        self.require_atomic("update_record_merge")?;
        let mut inner = self.lock();
        let message = inner.messages.get_mut(id).ok_or(StoreError::NotFound)?;
        if let Some(content) = content {
            message.content = content.to_string();
        }
        if let Some(patch) = patch {
            patch.apply(&mut message.metadata);
        }
        message.updated_at = now_millis();
        Ok(())
    }

    async fn replace_message(
        &self,
        id: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        let message = inner.messages.get_mut(id).ok_or(StoreError::NotFound)?;
        message.content = content.to_string();
        message.metadata = metadata.clone();
        message.updated_at = now_millis();
        Ok(())
    }
}
