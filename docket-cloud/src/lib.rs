//! docket-cloud — resource accounting and shared-record state service
//!
//! Long-running service that:
//! - Meters per-subscription resource usage for the current billing period
//! - Answers quota checks against the plan catalog
//! - Applies concurrent-safe partial updates to shared message records
//!
//! The counter and merge primitives execute atomically inside the
//! database. On a deployment whose schema predates those procedures,
//! operations degrade to logged non-atomic fallbacks instead of
//! failing.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod state;

// Re-exports
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
