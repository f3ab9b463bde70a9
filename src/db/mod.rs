pub mod config;
pub mod operations;

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::config::{DbConfig, DbConfigError};

/// Handle on the Postgres database that owns mastery and streak state.
#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: PgPool,
}

impl DatabaseProxy {
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let config = DbConfig::from_env()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.primary_url)
            .await
            .map_err(DbInitError::Sqlx)?;

        Ok(Arc::new(Self { config, pool }))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip latency of `SELECT 1`, or `None` on error or timeout.
    pub async fn ping(&self) -> Option<Duration> {
        let started = Instant::now();
        let result = tokio::time::timeout(
            self.config.health_check_timeout,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await;

        match result {
            Ok(Ok(_)) => Some(started.elapsed()),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "database health check failed");
                None
            }
            Err(_) => {
                tracing::warn!("database health check timed out");
                None
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
