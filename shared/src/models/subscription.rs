//! Subscription Model

use serde::{Deserialize, Serialize};

use crate::util::month_bounds_millis;

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid up, counted for quota decisions
    Active,
    /// Payment failed or past due
    PastDue,
    /// Subscription canceled
    Canceled,
}

impl SubscriptionStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "past_due" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }

    /// Does this subscription count for quota and metering?
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Subscription entity
///
/// At most one active subscription per account; historical rows are
/// retained but excluded from active lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub account_id: String,
    /// Plan tier string as stored ("free", "pro", "team")
    pub plan: String,
    pub status: SubscriptionStatus,
    /// Billing-provider period bounds, epoch milliseconds; absent for
    /// subscriptions without provider-driven billing cycles
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub created_at: i64,
}

impl Subscription {
    /// Billing period containing `now`, as `(start, end)` epoch milliseconds.
    ///
    /// Uses the subscription's own period bounds when they bracket `now`,
    /// otherwise falls back to the UTC calendar month. The end bound is
    /// exclusive.
    pub fn billing_period(&self, now: i64) -> (i64, i64) {
        match (self.current_period_start, self.current_period_end) {
            (Some(start), Some(end)) if start <= now && now < end => (start, end),
            _ => month_bounds_millis(now),
        }
    }
}
