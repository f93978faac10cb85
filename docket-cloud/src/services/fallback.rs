//! Fallback from atomic store primitives to degraded paths
//!
//! Every atomic operation shares one rule: when the procedure is
//! missing from the deployed schema, run the caller-supplied
//! non-atomic fallback and log the degradation exactly once. All
//! other errors propagate unchanged and never trigger the fallback.

use std::future::Future;

use crate::db::StoreError;

/// Identifies the degraded operation in the log line
pub struct FallbackContext<'a> {
    /// Operation name as exposed by the store
    pub operation: &'a str,
    /// Subscription, account or record the operation targets
    pub target: &'a str,
}

/// Run `atomic`; on [`StoreError::ProcedureUnavailable`] run
/// `fallback` instead.
pub async fn execute<T, A, F, Fut>(
    atomic: A,
    fallback: F,
    ctx: FallbackContext<'_>,
) -> Result<T, StoreError>
where
    A: Future<Output = Result<T, StoreError>>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match atomic.await {
        Err(StoreError::ProcedureUnavailable { procedure }) => {
            tracing::warn!(
                operation = ctx.operation,
                target = ctx.target,
                procedure = %procedure,
                "Atomic procedure unavailable, running degraded non-atomic path"
            );
            fallback().await
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> FallbackContext<'static> {
        FallbackContext {
            operation: "increment_usage",
            target: "sub-1",
        }
    }

    fn unavailable() -> StoreError {
        StoreError::ProcedureUnavailable {
            procedure: "increment_usage".to_string(),
        }
    }

    #[tokio::test]
    async fn test_atomic_success_skips_fallback() {
        let calls = AtomicUsize::new(0);
        let result = execute(
            async { Ok::<i64, StoreError>(7) },
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            },
            ctx(),
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_runs_fallback_once() {
        let calls = AtomicUsize::new(0);
        let result = execute(
            async { Err::<i64, StoreError>(unavailable()) },
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            },
            ctx(),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backend_error_propagates_without_fallback() {
        let calls = AtomicUsize::new(0);
        let result = execute(
            async { Err::<(), StoreError>(StoreError::Backend("connection reset".into())) },
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            ctx(),
        )
        .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_found_propagates_without_fallback() {
        let calls = AtomicUsize::new(0);
        let result = execute(
            async { Err::<(), StoreError>(StoreError::NotFound) },
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            ctx(),
        )
        .await;

        assert!(matches!(result, Err(StoreError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_error_propagates() {
        let result = execute(
            async { Err::<(), StoreError>(unavailable()) },
            || async { Err(StoreError::Backend("write failed".into())) },
            ctx(),
        )
        .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
