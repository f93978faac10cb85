//! Message endpoints
//!
//! PATCH is the single write path for concurrent writers; each sends
//! only the fields it owns and the store merges them.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Map, Value};

use shared::error::{ApiResponse, AppError};
use shared::models::{MergePatch, Message};

use crate::db::StoreError;
use crate::error::ServiceError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

pub async fn create_message(
    State(state): State<AppState>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<ApiResponse<Message>, ServiceError> {
    let message = state.merge.create_message(req.content, req.metadata).await?;
    Ok(ApiResponse::success(message))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Message>, ServiceError> {
    let message = state
        .merge
        .find_message(&id)
        .await?
        .ok_or_else(|| AppError::message_not_found(&id))?;
    Ok(ApiResponse::success(message))
}

pub async fn merge_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<MergePatch>,
) -> Result<ApiResponse<()>, ServiceError> {
    state
        .merge
        .merge_update(&id, &patch)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ServiceError::App(AppError::message_not_found(&id)),
            other => other.into(),
        })?;
    Ok(ApiResponse::ok())
}
