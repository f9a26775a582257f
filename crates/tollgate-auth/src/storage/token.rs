//! Token record store trait.
//!
//! This module defines the storage interface for issued token records.
//!
//! # Contract
//!
//! - `create` is an upsert keyed by access handle; the last writer wins
//! - Lookups enforce expiry at read time and return `None` for elapsed windows
//! - Removals are idempotent
//! - The sweep only deletes records whose access and refresh windows have
//!   both elapsed
//! - Every operation is atomic, so dropping the future mid-call leaves no
//!   partial record

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{TokenRecord, TokenStats};

/// Storage trait for issued token records.
///
/// # Implementations
///
/// - [`InMemoryTokenStore`](crate::storage::InMemoryTokenStore) - process-local store
/// - `tollgate-auth-postgres` - PostgreSQL storage backend
///
/// Either can be wrapped in an
/// [`AuditedTokenStore`](crate::storage::AuditedTokenStore) for per-call
/// timeouts and audit logging; see [`build_token_store`](crate::storage::build_token_store).
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stores a record, replacing any record with the same access handle.
    ///
    /// The store stamps `updated_at` itself.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` if the record violates its
    /// invariants, `AuthError::Conflict` if the refresh handle already belongs
    /// to a different access handle, and `AuthError::Transient` if the
    /// backend is unreachable.
    async fn create(&self, record: &TokenRecord) -> AuthResult<()>;

    /// Finds a record by access handle.
    ///
    /// # Returns
    ///
    /// Returns `None` if the handle is unknown or its access window has
    /// elapsed, even if the row has not been swept yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_by_access(&self, access_handle: &str) -> AuthResult<Option<TokenRecord>>;

    /// Finds a record by refresh handle.
    ///
    /// # Returns
    ///
    /// Returns `None` if the handle is unknown or its refresh window has
    /// elapsed. Records without a refresh window are never returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_by_refresh(&self, refresh_handle: &str) -> AuthResult<Option<TokenRecord>>;

    /// Deletes the record with this access handle.
    ///
    /// Removing an unknown handle succeeds and reports 0 rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove_by_access(&self, access_handle: &str) -> AuthResult<u64>;

    /// Deletes the record with this refresh handle.
    ///
    /// Removing an unknown handle succeeds and reports 0 rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove_by_refresh(&self, refresh_handle: &str) -> AuthResult<u64>;

    /// Authorization codes are owned by the external protocol engine.
    ///
    /// Always `Ok(None)`, so the engine's fallback lookup proceeds.
    async fn get_by_code(&self, _code: &str) -> AuthResult<Option<TokenRecord>> {
        Ok(None)
    }

    /// Authorization codes are owned by the external protocol engine.
    ///
    /// Always `Ok(())`.
    async fn remove_by_code(&self, _code: &str) -> AuthResult<()> {
        Ok(())
    }

    /// Deletes every record whose access and refresh windows have both elapsed.
    ///
    /// # Returns
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn clean_expired_tokens(&self) -> AuthResult<u64>;

    /// Point-in-time counts for observability.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_stats(&self) -> AuthResult<TokenStats>;
}
