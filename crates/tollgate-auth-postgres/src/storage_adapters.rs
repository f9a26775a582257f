//! Arc-owning storage adapters.
//!
//! These adapters wrap the lifetime-based storage types and own an
//! `Arc<PgPool>`, allowing them to be used as `Arc<dyn TokenStore>` and
//! friends by the core crate.

use std::sync::Arc;

use async_trait::async_trait;

use tollgate_auth::clock::Clock;
use tollgate_auth::storage::{
    ClientStorage as ClientStorageTrait, TokenStore, UserStorage as UserStorageTrait,
};
use tollgate_auth::types::{ClientCredential, TokenRecord, TokenStats, UserCredential};
use tollgate_auth::{AuthError, AuthResult};

use crate::client::ClientStorage;
use crate::token::TokenStorage;
use crate::user::UserStorage;
use crate::{PgPool, StorageError};

/// Maps a backend error into the core error, keeping its kind.
///
/// Connectivity failures become `AuthError::Transient`; the rest become
/// `AuthError::Storage`. `context` names the failed operation.
#[must_use]
pub fn map_storage_error(context: &str, err: StorageError) -> AuthError {
    match err {
        StorageError::Conflict(message) => AuthError::conflict(message),
        StorageError::NotFound(resource) => AuthError::not_found(resource),
        StorageError::InvalidInput(message) => AuthError::invalid_request(message),
        e if e.is_transient() => AuthError::transient(format!("{context}: {e}")),
        e => AuthError::storage(format!("{context}: {e}")),
    }
}

fn to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

// =============================================================================
// Arc-Owning Token Store
// =============================================================================

/// Arc-owning PostgreSQL token store.
#[derive(Clone)]
pub struct ArcTokenStore {
    pool: Arc<PgPool>,
    clock: Arc<dyn Clock>,
}

impl ArcTokenStore {
    /// Create a new Arc-owning token store.
    #[must_use]
    pub fn new(pool: Arc<PgPool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl TokenStore for ArcTokenStore {
    async fn create(&self, record: &TokenRecord) -> AuthResult<()> {
        record.validate()?;
        TokenStorage::new(&self.pool)
            .upsert(record, self.clock.now())
            .await
            .map_err(|e| map_storage_error("create token", e))
    }

    async fn get_by_access(&self, access_handle: &str) -> AuthResult<Option<TokenRecord>> {
        TokenStorage::new(&self.pool)
            .find_live_by_access(access_handle, self.clock.now())
            .await
            .map_err(|e| map_storage_error("get token by access handle", e))
    }

    async fn get_by_refresh(&self, refresh_handle: &str) -> AuthResult<Option<TokenRecord>> {
        TokenStorage::new(&self.pool)
            .find_live_by_refresh(refresh_handle, self.clock.now())
            .await
            .map_err(|e| map_storage_error("get token by refresh handle", e))
    }

    async fn remove_by_access(&self, access_handle: &str) -> AuthResult<u64> {
        TokenStorage::new(&self.pool)
            .delete_by_access(access_handle)
            .await
            .map_err(|e| map_storage_error("remove token by access handle", e))
    }

    async fn remove_by_refresh(&self, refresh_handle: &str) -> AuthResult<u64> {
        TokenStorage::new(&self.pool)
            .delete_by_refresh(refresh_handle)
            .await
            .map_err(|e| map_storage_error("remove token by refresh handle", e))
    }

    async fn clean_expired_tokens(&self) -> AuthResult<u64> {
        TokenStorage::new(&self.pool)
            .delete_expired(self.clock.now())
            .await
            .map_err(|e| map_storage_error("clean expired tokens", e))
    }

    async fn get_stats(&self) -> AuthResult<TokenStats> {
        let counts = TokenStorage::new(&self.pool)
            .counts(self.clock.now())
            .await
            .map_err(|e| map_storage_error("token stats", e))?;

        Ok(TokenStats::new(
            to_u64(counts.total),
            to_u64(counts.active),
            to_u64(counts.with_refresh),
        ))
    }
}

// =============================================================================
// Arc-Owning Client Storage
// =============================================================================

/// Arc-owning PostgreSQL client storage adapter.
#[derive(Clone)]
pub struct ArcClientStorage {
    pool: Arc<PgPool>,
}

impl ArcClientStorage {
    /// Create a new Arc-owning client storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStorageTrait for ArcClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<ClientCredential>> {
        ClientStorage::new(&self.pool)
            .find_by_id(client_id)
            .await
            .map_err(|e| map_storage_error("find client", e))
    }

    async fn create(&self, client: &ClientCredential) -> AuthResult<()> {
        ClientStorage::new(&self.pool)
            .create(client)
            .await
            .map_err(|e| map_storage_error("create client", e))
    }
}

// =============================================================================
// Arc-Owning User Storage
// =============================================================================

/// Arc-owning PostgreSQL user storage adapter.
#[derive(Clone)]
pub struct ArcUserStorage {
    pool: Arc<PgPool>,
}

impl ArcUserStorage {
    /// Create a new Arc-owning user storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorageTrait for ArcUserStorage {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserCredential>> {
        UserStorage::new(&self.pool)
            .find_by_username(username)
            .await
            .map_err(|e| map_storage_error("find user", e))
    }

    async fn create(&self, user: &UserCredential) -> AuthResult<()> {
        UserStorage::new(&self.pool)
            .create(user)
            .await
            .map_err(|e| map_storage_error("create user", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_keeps_kind() {
        let err = map_storage_error("create token", StorageError::conflict("taken"));
        assert!(matches!(err, AuthError::Conflict { ref message } if message == "taken"));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = map_storage_error(
            "get token by access handle",
            StorageError::Database(sqlx_core::Error::PoolTimedOut),
        );
        assert!(err.is_retryable());
        assert!(err.to_string().contains("get token by access handle"));
    }

    #[test]
    fn test_row_errors_are_storage() {
        let err = map_storage_error("find user", StorageError::Database(sqlx_core::Error::RowNotFound));
        assert!(matches!(err, AuthError::Storage { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_input_is_invalid_request() {
        let err = map_storage_error("create token", StorageError::invalid_input("bad"));
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
    }

    #[test]
    fn test_negative_counts_clamp() {
        assert_eq!(to_u64(-1), 0);
        assert_eq!(to_u64(7), 7);
    }
}
