//! Connection pool management for the PostgreSQL auth backend.

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::Postgres;
use tracing::{debug, info, instrument};

use tollgate_auth::config::{DatabaseConfig, mask_password};

use crate::{PgPool, StorageResult};

/// Type alias for PostgreSQL pool options.
pub type PgPoolOptions = PoolOptions<Postgres>;

/// Creates a connection pool from the `database` config section.
///
/// The acquire timeout is the only bound a minimal-mode store has on a
/// stalled database.
#[instrument(skip(config), fields(url = %mask_password(&config.url)))]
pub async fn create_pool(config: &DatabaseConfig) -> StorageResult<PgPool> {
    info!(
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "Creating PostgreSQL connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .test_before_acquire(false)
        .connect(&config.url)
        .await?;

    debug!("PostgreSQL connection pool created successfully");
    Ok(pool)
}
