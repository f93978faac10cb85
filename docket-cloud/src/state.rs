//! Application state for docket-cloud

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::Config;
use crate::db::PgStore;
use crate::services::{MergeService, UsageService};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Usage metering and quota checks
    pub usage: UsageService,
    /// Concurrent-safe partial message updates
    pub merge: MergeService,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        // statement_timeout bounds every statement, including the
        // atomic procedures; a timeout surfaces as a backend error,
        // never as a missing procedure
        let connect_options = PgConnectOptions::from_str(&config.database_url)?
            .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let store = Arc::new(PgStore::new(pool));
        Ok(Self {
            usage: UsageService::new(store.clone()),
            merge: MergeService::new(store),
        })
    }
}
