//! Subscription database operations

use sqlx::PgPool;

use shared::models::{Subscription, SubscriptionStatus};

/// Subscription row as stored
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: String,
    account_id: String,
    plan: String,
    status: String,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    created_at: i64,
}

impl SubscriptionRow {
    fn into_model(self) -> Subscription {
        Subscription {
            id: self.id,
            account_id: self.account_id,
            plan: self.plan,
            // Unknown status strings are treated as inactive
            status: SubscriptionStatus::from_db(&self.status)
                .unwrap_or(SubscriptionStatus::Canceled),
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            created_at: self.created_at,
        }
    }
}

/// Most recent active subscription for an account
pub async fn get_active_subscription(
    pool: &PgPool,
    account_id: &str,
) -> Result<Option<Subscription>, sqlx::Error> {
    let row = sqlx::query_as::<_, SubscriptionRow>(
        r#"
        SELECT id, account_id, plan, status,
               current_period_start, current_period_end, created_at
        FROM subscriptions
        WHERE account_id = $1 AND status = 'active'
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(SubscriptionRow::into_model))
}
