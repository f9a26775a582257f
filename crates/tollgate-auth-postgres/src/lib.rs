//! PostgreSQL storage backend for Tollgate auth
//!
//! Provides persistent storage for:
//!
//! - Issued token records (`tokens`)
//! - OAuth clients (`clients`)
//! - Password users (`users`)
//!
//! Tables are created by the embedded migrations in [`migrations`].
//!
//! # Example
//!
//! ```ignore
//! use tollgate_auth_postgres::PostgresAuthStorage;
//!
//! let storage = PostgresAuthStorage::connect(&config.database, clock).await?;
//! let tokens = storage.token_store(&config.store);
//! let record = tokens.get_by_access(handle).await?;
//! ```

pub mod client;
pub mod migrations;
pub mod pool;
pub mod storage_adapters;
pub mod token;
pub mod user;

use std::sync::Arc;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;
use tracing::{debug, info};

use tollgate_auth::clock::Clock;
use tollgate_auth::config::{DatabaseConfig, StoreConfig};
use tollgate_auth::storage::{
    ClientStorage as ClientStorageTrait, TokenStore, UserStorage as UserStorageTrait,
    build_token_store,
};
use tollgate_auth::AuthResult;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use client::ClientStorage;
pub use storage_adapters::{ArcClientStorage, ArcTokenStore, ArcUserStorage, map_storage_error};
pub use token::TokenStorage;
pub use user::UserStorage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during auth storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists (conflict).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if the database could not be reached in time.
    ///
    /// These are worth retrying by the caller; everything else is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(
                sqlx_core::Error::PoolTimedOut
                    | sqlx_core::Error::PoolClosed
                    | sqlx_core::Error::Io(_)
                    | sqlx_core::Error::Tls(_)
                    | sqlx_core::Error::WorkerCrashed
            )
        )
    }

    /// Returns `true` if this is a client error (4xx equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidInput(_)
        )
    }

    /// Returns `true` if this is a server error (5xx equivalent).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Migration(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// PostgreSQL Auth Storage
// =============================================================================

/// PostgreSQL storage backend for authentication data.
///
/// Holds the connection pool and the clock used for expiry comparisons, and
/// hands out the trait objects the core crate consumes.
#[derive(Debug, Clone)]
pub struct PostgresAuthStorage {
    pool: Arc<PgPool>,
    clock: Arc<dyn Clock>,
}

impl PostgresAuthStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Connect using the `database` config section.
    ///
    /// Applies embedded migrations when `run_migrations` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn connect(config: &DatabaseConfig, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        let pool = pool::create_pool(config).await?;
        if config.run_migrations {
            migrations::run(&pool).await?;
        }
        info!("PostgreSQL auth storage ready");
        Ok(Self::new(Arc::new(pool), clock))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the Arc-wrapped pool.
    #[must_use]
    pub fn pool_arc(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    // -------------------------------------------------------------------------
    // Storage Accessors
    // -------------------------------------------------------------------------

    /// Get token storage operations.
    #[must_use]
    pub fn tokens(&self) -> TokenStorage<'_> {
        TokenStorage::new(&self.pool)
    }

    /// Get client storage operations.
    #[must_use]
    pub fn clients(&self) -> ClientStorage<'_> {
        ClientStorage::new(&self.pool)
    }

    /// Get user storage operations.
    #[must_use]
    pub fn users(&self) -> UserStorage<'_> {
        UserStorage::new(&self.pool)
    }

    /// Token store for the configured mode (minimal or hardened).
    #[must_use]
    pub fn token_store(&self, config: &StoreConfig) -> Arc<dyn TokenStore> {
        build_token_store(
            config,
            Arc::new(ArcTokenStore::new(self.pool_arc(), Arc::clone(&self.clock))),
        )
    }

    /// Client storage as a trait object.
    #[must_use]
    pub fn client_storage(&self) -> Arc<dyn ClientStorageTrait> {
        Arc::new(ArcClientStorage::new(self.pool_arc()))
    }

    /// User storage as a trait object.
    #[must_use]
    pub fn user_storage(&self) -> Arc<dyn UserStorageTrait> {
        Arc::new(ArcUserStorage::new(self.pool_arc()))
    }

    /// Round-trips `SELECT 1`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Transient` if the database is unreachable.
    pub async fn check_health(&self) -> AuthResult<()> {
        sqlx_core::query::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| map_storage_error("health check", StorageError::from(e)))?;

        debug!("Database health check passed");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_conflict() {
        let err = StorageError::conflict("Client already exists");
        assert!(err.is_conflict());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_storage_error_not_found() {
        let err = StorageError::not_found("client abc123");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Not found: client abc123");
    }

    #[test]
    fn test_storage_error_transient() {
        assert!(StorageError::Database(sqlx_core::Error::PoolTimedOut).is_transient());
        assert!(StorageError::Database(sqlx_core::Error::PoolClosed).is_transient());
        assert!(!StorageError::Database(sqlx_core::Error::RowNotFound).is_transient());
        assert!(!StorageError::Migration("boom".into()).is_transient());
        assert!(StorageError::Migration("boom".into()).is_server_error());
    }
}
