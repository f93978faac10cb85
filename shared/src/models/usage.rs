//! Usage Record Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::plan::Metric;

/// One usage counter for `(subscription, metric, period)`
///
/// Created implicitly by the first increment in a billing period and
/// mutated only by further increments in that period. Period rollover
/// starts a new record; closed records are kept for history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub subscription_id: String,
    /// Metric name string as stored ("cases", "ai_requests", ...)
    pub metric: String,
    pub quantity: i64,
    /// Period bounds, epoch milliseconds; end is exclusive
    pub period_start: i64,
    pub period_end: i64,
    pub updated_at: i64,
}

/// Current-period usage keyed by metric
pub type UsageTotals = BTreeMap<Metric, i64>;
