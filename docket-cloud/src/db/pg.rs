//! PostgreSQL-backed store

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;

use shared::models::{Message, MetadataPatch, Metric, Subscription};
use shared::util::now_millis;

use super::{MessageStore, StoreError, StoreResult, UsageStore};
use super::{messages, subscriptions, usage};

/// SQLSTATE for a call to a function the schema does not have
const UNDEFINED_FUNCTION: &str = "42883";
/// SQLSTATE raised by the merge procedure for a missing record
const NO_DATA_FOUND: &str = "P0002";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn classify_sqlstate(procedure: &str, code: Option<&str>) -> Option<StoreError> {
    match code {
        Some(UNDEFINED_FUNCTION) => Some(StoreError::ProcedureUnavailable {
            procedure: procedure.to_string(),
        }),
        Some(NO_DATA_FOUND) => Some(StoreError::NotFound),
        _ => None,
    }
}

/// Map an error from an atomic procedure call. Only an undefined
/// function is reported as unavailable; a statement timeout or any
/// other failure stays a backend error.
fn classify_atomic(procedure: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(store_err) = classify_sqlstate(procedure, db_err.code().as_deref()) {
            return store_err;
        }
    }
    StoreError::Backend(err.into())
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.into())
}

fn parse_counters(rows: Vec<(String, i64)>) -> Vec<(Metric, i64)> {
    // Counter rows are only ever written through Metric::as_str; an
    // unrecognized name (a newer deployment's metric) is skipped
    // rather than failing the whole read
    rows.into_iter()
        .filter_map(|(metric, quantity)| match Metric::from_str_opt(&metric) {
            Some(metric) => Some((metric, quantity)),
            None => {
                tracing::debug!(metric, "Skipping counter row with unknown metric");
                None
            }
        })
        .collect()
}

#[async_trait]
impl UsageStore for PgStore {
    async fn active_subscription(&self, account_id: &str) -> StoreResult<Option<Subscription>> {
        subscriptions::get_active_subscription(&self.pool, account_id)
            .await
            .map_err(backend)
    }

    async fn increment_usage(
        &self,
        subscription_id: &str,
        metric: Metric,
        quantity: i64,
    ) -> StoreResult<()> {
        usage::increment_atomic(&self.pool, subscription_id, metric.as_str(), quantity)
            .await
            .map_err(|e| classify_atomic("increment_usage", e))
    }

    async fn check_quota(
        &self,
        account_id: &str,
        metric: Metric,
        required: i64,
    ) -> StoreResult<bool> {
        usage::check_quota_atomic(&self.pool, account_id, metric.as_str(), required)
            .await
            .map_err(|e| classify_atomic("check_quota", e))
    }

    async fn current_usage(&self, subscription_id: &str) -> StoreResult<Vec<(Metric, i64)>> {
        let rows = usage::current_usage_atomic(&self.pool, subscription_id)
            .await
            .map_err(|e| classify_atomic("get_current_usage", e))?;
        Ok(parse_counters(rows))
    }

    async fn read_counter(
        &self,
        subscription_id: &str,
        metric: Metric,
        period_start: i64,
    ) -> StoreResult<Option<i64>> {
        usage::read_counter(&self.pool, subscription_id, metric.as_str(), period_start)
            .await
            .map_err(backend)
    }

    async fn write_counter(
        &self,
        subscription_id: &str,
        metric: Metric,
        quantity: i64,
        period_start: i64,
        period_end: i64,
    ) -> StoreResult<()> {
        usage::write_counter(
            &self.pool,
            subscription_id,
            metric.as_str(),
            quantity,
            period_start,
            period_end,
            now_millis(),
        )
        .await
        .map_err(backend)
    }

    async fn list_counters(
        &self,
        subscription_id: &str,
        period_start: i64,
    ) -> StoreResult<Vec<(Metric, i64)>> {
        let rows = usage::list_counters(&self.pool, subscription_id, period_start)
            .await
            .map_err(backend)?;
        Ok(parse_counters(rows))
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn create_message(&self, message: &Message) -> StoreResult<()> {
        messages::create(&self.pool, message).await.map_err(backend)
    }

    async fn find_message(&self, id: &str) -> StoreResult<Option<Message>> {
        messages::find_by_id(&self.pool, id).await.map_err(backend)
    }

    async fn merge_message(
        &self,
        id: &str,
        content: Option<&str>,
        patch: Option<&MetadataPatch>,
    ) -> StoreResult<()> {
        messages::merge_atomic(&self.pool, id, content, patch)
            .await
            .map_err(|e| classify_atomic("update_record_merge", e))
    }

    async fn replace_message(
        &self,
        id: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> StoreResult<()> {
        let affected = messages::replace(&self.pool, id, content, metadata, now_millis())
            .await
            .map_err(backend)?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_function_is_procedure_unavailable() {
        let err = classify_sqlstate("increment_usage", Some("42883"));
        match err {
            Some(StoreError::ProcedureUnavailable { procedure }) => {
                assert_eq!(procedure, "increment_usage");
            }
            other => panic!("expected ProcedureUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_no_data_found_is_not_found() {
        let err = classify_sqlstate("update_record_merge", Some("P0002"));
        assert!(matches!(err, Some(StoreError::NotFound)));
    }

    #[test]
    fn test_statement_timeout_is_not_classified() {
        // 57014 (query_canceled) must stay a backend failure so a slow
        // database never flips callers onto the degraded path
        assert!(classify_sqlstate("check_quota", Some("57014")).is_none());
        assert!(classify_sqlstate("check_quota", None).is_none());
    }

    #[test]
    fn test_non_database_errors_are_backend() {
        let err = classify_atomic("check_quota", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));

        let err = classify_atomic("check_quota", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_parse_counters_skips_unknown_metrics() {
        let rows = vec![
            ("cases".to_string(), 3),
            ("not_a_metric".to_string(), 9),
            ("ai_requests".to_string(), 41),
        ];
        let parsed = parse_counters(rows);
        assert_eq!(
            parsed,
            vec![(Metric::Cases, 3), (Metric::AiRequests, 41)]
        );
    }
}
