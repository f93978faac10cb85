//! Database access layer
//!
//! Plain SQL helpers live in per-table modules as free functions over
//! `&PgPool`. Services never touch those directly: they are written
//! against the [`UsageStore`] / [`MessageStore`] traits, with
//! [`PgStore`] as the production implementation and [`MemoryStore`]
//! for tests and local development.

pub mod memory;
pub mod messages;
pub mod pg;
pub mod subscriptions;
pub mod usage;

// Re-exports
pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use shared::models::{Message, MetadataPatch, Metric, Subscription};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced record does not exist
    #[error("record not found")]
    NotFound,
    /// The atomic primitive is missing from the deployed schema
    /// (SQLSTATE 42883). This is the only condition that triggers the
    /// non-atomic degraded path; timeouts and transport failures are
    /// [`StoreError::Backend`].
    #[error("stored procedure {procedure} is unavailable")]
    ProcedureUnavailable { procedure: String },
    /// Connection, timeout, constraint or other backend failure
    #[error("backend failure: {0}")]
    Backend(BoxError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operations backing usage metering and quota checks.
///
/// `increment_usage`, `check_quota` and `current_usage` execute as
/// single server-side statements. The counter methods below them are
/// the plain read/write building blocks the degraded paths compose
/// when those primitives are unavailable.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Most recent active subscription for an account, if any
    async fn active_subscription(&self, account_id: &str) -> StoreResult<Option<Subscription>>;

    /// Atomically add `quantity` to the current-period counter
    async fn increment_usage(
        &self,
        subscription_id: &str,
        metric: Metric,
        quantity: i64,
    ) -> StoreResult<()>;

    /// Atomically decide whether `required` more units fit within the
    /// account's plan limit for `metric`
    async fn check_quota(&self, account_id: &str, metric: Metric, required: i64)
    -> StoreResult<bool>;

    /// All current-period counters for a subscription, atomically read
    async fn current_usage(&self, subscription_id: &str) -> StoreResult<Vec<(Metric, i64)>>;

    /// Read a single counter; `None` when no row exists yet
    async fn read_counter(
        &self,
        subscription_id: &str,
        metric: Metric,
        period_start: i64,
    ) -> StoreResult<Option<i64>>;

    /// Write a counter to an absolute value (not additive)
    async fn write_counter(
        &self,
        subscription_id: &str,
        metric: Metric,
        quantity: i64,
        period_start: i64,
        period_end: i64,
    ) -> StoreResult<()>;

    /// Plain read of all counters in the given period
    async fn list_counters(
        &self,
        subscription_id: &str,
        period_start: i64,
    ) -> StoreResult<Vec<(Metric, i64)>>;
}

/// Store operations backing message reads and merge updates.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(&self, message: &Message) -> StoreResult<()>;

    async fn find_message(&self, id: &str) -> StoreResult<Option<Message>>;

    /// Atomic partial update: replace content if given, merge the
    /// single metadata key if given. [`StoreError::NotFound`] when the
    /// message does not exist.
    async fn merge_message(
        &self,
        id: &str,
        content: Option<&str>,
        patch: Option<&MetadataPatch>,
    ) -> StoreResult<()>;

    /// Whole-record write-back used by the degraded merge path
    async fn replace_message(
        &self,
        id: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> StoreResult<()>;
}
