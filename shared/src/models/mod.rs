//! Data models
//!
//! Shared between docket-cloud and frontend (via API).
//! All timestamps are UTC epoch milliseconds (`i64`).

pub mod message;
pub mod plan;
pub mod subscription;
pub mod usage;

// Re-exports
pub use message::*;
pub use plan::*;
pub use subscription::*;
pub use usage::*;
