//! Account store connection
//!
//! Opens the Postgres pool the user store runs on, applies the embedded
//! schema and reports whether the store can serve requests.

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

/// Failures while bringing the account store up
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Account store unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Account schema could not be applied: {0}")]
    SchemaFailed(String),
}

/// What the pool needs to know, taken from [`Config`]
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    /// `url` with the password masked
    pub display_url: String,
    pub max_connections: u32,
    /// Login and refresh wait at most this long for a connection
    pub acquire_timeout: Duration,
}

impl PoolSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.database_url.clone(),
            display_url: config.database_url_masked(),
            max_connections: config.db_max_connections,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Readiness of the account store, as reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreHealth {
    /// Connected and the `users` table exists
    Ready,
    /// Connected but migrations have not created `users`
    SchemaMissing,
    Unreachable,
}

impl StoreHealth {
    pub fn is_ready(self) -> bool {
        self == StoreHealth::Ready
    }
}

/// Open the pool. The service refuses to start without it.
pub async fn create_pool(settings: &PoolSettings) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %settings.display_url,
        max_connections = settings.max_connections,
        "Connecting to account store"
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.url)
        .await
        .map_err(|e| DbError::Unreachable {
            url: settings.display_url.clone(),
            reason: e.to_string(),
        })?;

    Ok(pool)
}

/// Create or upgrade the `users` table
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("./migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| DbError::SchemaFailed(e.to_string()))?;

    tracing::info!(migrations = migrator.iter().count(), "Account schema up to date");

    Ok(())
}

/// Probe the store the way login does: a round trip that needs `users`.
pub async fn check_health(pool: &PgPool) -> StoreHealth {
    let probe = sqlx::query_scalar::<_, bool>("SELECT to_regclass('public.users') IS NOT NULL")
        .fetch_one(pool)
        .await;

    match probe {
        Ok(true) => StoreHealth::Ready,
        Ok(false) => StoreHealth::SchemaMissing,
        Err(e) => {
            tracing::warn!(error = %e, "Account store health probe failed");
            StoreHealth::Unreachable
        }
    }
}
