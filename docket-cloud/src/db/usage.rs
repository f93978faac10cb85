//! Usage counter database operations
//!
//! The `*_atomic` functions call procedures installed by the
//! `0002_atomic_ops` migration; on a deployment whose schema predates
//! it they fail with SQLSTATE 42883. The remaining functions are the
//! plain reads and writes the degraded paths are built from.

use sqlx::PgPool;

/// Atomically add to a current-period counter, creating the row on
/// first use. Period bounds are resolved inside the procedure from
/// the subscription row.
pub async fn increment_atomic(
    pool: &PgPool,
    subscription_id: &str,
    metric: &str,
    quantity: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT increment_usage($1, $2, $3)")
        .bind(subscription_id)
        .bind(metric)
        .bind(quantity)
        .execute(pool)
        .await?;
    Ok(())
}

/// Atomically decide whether `required` more units fit within the
/// account's plan limit. Resolution of subscription, period, counter
/// and limit all happen inside the procedure.
pub async fn check_quota_atomic(
    pool: &PgPool,
    account_id: &str,
    metric: &str,
    required: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT check_quota($1, $2, $3)")
        .bind(account_id)
        .bind(metric)
        .bind(required)
        .fetch_one(pool)
        .await
}

/// All current-period counters for a subscription
pub async fn current_usage_atomic(
    pool: &PgPool,
    subscription_id: &str,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>("SELECT metric, quantity FROM get_current_usage($1)")
        .bind(subscription_id)
        .fetch_all(pool)
        .await
}

/// Read a single counter; `None` when no row exists yet
pub async fn read_counter(
    pool: &PgPool,
    subscription_id: &str,
    metric: &str,
    period_start: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT quantity FROM usage_records
        WHERE subscription_id = $1 AND metric = $2 AND period_start = $3
        "#,
    )
    .bind(subscription_id)
    .bind(metric)
    .bind(period_start)
    .fetch_optional(pool)
    .await
}

/// Write a counter to an absolute value (upsert on the period key)
pub async fn write_counter(
    pool: &PgPool,
    subscription_id: &str,
    metric: &str,
    quantity: i64,
    period_start: i64,
    period_end: i64,
    updated_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO usage_records (subscription_id, metric, quantity,
                                   period_start, period_end, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (subscription_id, metric, period_start)
        DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(subscription_id)
    .bind(metric)
    .bind(quantity)
    .bind(period_start)
    .bind(period_end)
    .bind(updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Plain read of all counters in the given period
pub async fn list_counters(
    pool: &PgPool,
    subscription_id: &str,
    period_start: i64,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT metric, quantity FROM usage_records
        WHERE subscription_id = $1 AND period_start = $2
        "#,
    )
    .bind(subscription_id)
    .bind(period_start)
    .fetch_all(pool)
    .await
}
