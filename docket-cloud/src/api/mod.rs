//! API routes for docket-cloud

pub mod health;
pub mod messages;
pub mod usage;

use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::auth::account_auth_middleware;
use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Account-scoped API (gateway-authenticated)
    let api = Router::new()
        .route("/api/usage", get(usage::get_usage))
        .route("/api/usage/increment", post(usage::increment_usage))
        .route("/api/limits", get(usage::get_limits))
        .route("/api/quota/check", post(usage::check_quota))
        .route("/api/messages", post(messages::create_message))
        .route(
            "/api/messages/{id}",
            get(messages::get_message).patch(messages::merge_message),
        )
        .layer(middleware::from_fn(account_auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
