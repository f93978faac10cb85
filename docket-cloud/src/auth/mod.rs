//! Request identity for the account-scoped API
//!
//! Session verification happens at the platform gateway; requests
//! reach this service with the verified account id in the
//! `x-account-id` header.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use shared::error::AppError;

/// Header carrying the gateway-verified account id
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Verified account identity, inserted as a request extension
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    pub account_id: String,
}

/// Middleware that requires the gateway identity header
pub async fn account_auth_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let account_id = request
        .headers()
        .get(ACCOUNT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let Some(account_id) = account_id else {
        return Err(AppError::not_authenticated().into_response());
    };

    request
        .extensions_mut()
        .insert(AccountIdentity { account_id });

    Ok(next.run(request).await)
}
