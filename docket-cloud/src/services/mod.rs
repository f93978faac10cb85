//! Service layer
//!
//! - [`UsageService`] - usage metering and quota checks
//! - [`MergeService`] - concurrent-safe partial message updates
//!
//! Services are constructed over `Arc<dyn ...Store>` trait objects.
//! The decision between an atomic store primitive and its degraded
//! non-atomic path lives here, not in the stores.

pub mod fallback;
pub mod merge;
pub mod usage;

// Re-exports
pub use merge::MergeService;
pub use usage::UsageService;
