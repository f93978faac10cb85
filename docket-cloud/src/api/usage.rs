//! Usage metering and quota endpoints

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use shared::error::{ApiResponse, AppError};
use shared::models::{Metric, PlanLimits, UsageTotals};

use crate::auth::AccountIdentity;
use crate::state::AppState;

/// Usage summary for the authenticated account
#[derive(Debug, Serialize)]
pub struct UsageSummary {
    pub usage: UsageTotals,
    pub limits: PlanLimits,
}

pub async fn get_usage(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
) -> ApiResponse<UsageSummary> {
    let (usage, limits) = state.usage.account_summary(&identity.account_id).await;
    ApiResponse::success(UsageSummary { usage, limits })
}

pub async fn get_limits(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
) -> ApiResponse<PlanLimits> {
    ApiResponse::success(state.usage.effective_limits(&identity.account_id).await)
}

#[derive(Debug, Deserialize)]
pub struct QuotaCheckRequest {
    pub metric: String,
    #[serde(default = "default_quantity")]
    pub required: i64,
}

#[derive(Debug, Serialize)]
pub struct QuotaCheckResponse {
    pub allowed: bool,
}

pub async fn check_quota(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Json(req): Json<QuotaCheckRequest>,
) -> Result<ApiResponse<QuotaCheckResponse>, AppError> {
    let metric = parse_metric(&req.metric)?;
    if req.required < 1 {
        return Err(AppError::validation("Required quantity must be at least 1"));
    }

    let allowed = state
        .usage
        .check_quota(&identity.account_id, metric, req.required)
        .await;
    Ok(ApiResponse::success(QuotaCheckResponse { allowed }))
}

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    pub metric: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// Record consumption after a metered action. The write is spawned;
/// the response does not wait for its outcome.
pub async fn increment_usage(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Json(req): Json<IncrementRequest>,
) -> Result<ApiResponse<()>, AppError> {
    let metric = parse_metric(&req.metric)?;
    if req.quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }

    let usage = state.usage.clone();
    let account_id = identity.account_id;
    tokio::spawn(async move {
        usage
            .increment_usage(&account_id, metric, req.quantity)
            .await;
    });

    Ok(ApiResponse::ok())
}

fn default_quantity() -> i64 {
    1
}

fn parse_metric(name: &str) -> Result<Metric, AppError> {
    Metric::from_str_opt(name)
        .ok_or_else(|| AppError::validation("Unknown metric").with_detail("metric", name))
}
