//! Shared types for the Docket backend
//!
//! Common types used across service crates: the unified error system,
//! subscription/plan/usage/message domain models, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
