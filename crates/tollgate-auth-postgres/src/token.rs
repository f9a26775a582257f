//! Token record storage.
//!
//! One row per access handle in the `tokens` table. Every method is a single
//! SQL statement, so dropping the future mid-call never leaves a partial
//! record. Expiry comparisons bind the caller's `now` instead of `NOW()`.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;

use tollgate_auth::types::TokenRecord;

use crate::{PgPool, StorageError, StorageResult};

// =============================================================================
// Types
// =============================================================================

type TokenTuple = (
    String,
    Option<String>,
    String,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    Option<OffsetDateTime>,
    OffsetDateTime,
);

const TOKEN_COLUMNS: &str = "access_handle, refresh_handle, client_id, user_id, scope, \
     access_created_at, access_expires_at, refresh_created_at, refresh_expires_at, updated_at";

fn record_from_tuple(row: TokenTuple) -> TokenRecord {
    TokenRecord {
        access_handle: row.0,
        refresh_handle: row.1,
        client_id: row.2,
        user_id: row.3,
        scope: row.4,
        access_created_at: row.5,
        access_expires_at: row.6,
        refresh_created_at: row.7,
        refresh_expires_at: row.8,
        updated_at: row.9,
    }
}

/// Raw counts behind `TokenStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCounts {
    /// All rows.
    pub total: i64,
    /// Rows whose access window is live.
    pub active: i64,
    /// Rows carrying a refresh handle.
    pub with_refresh: i64,
}

// =============================================================================
// Token Storage
// =============================================================================

/// Token record operations.
pub struct TokenStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenStorage<'a> {
    /// Create a new token storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the record keyed by its access handle.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the refresh handle belongs to a
    /// different access handle, or a database error.
    pub async fn upsert(&self, record: &TokenRecord, now: OffsetDateTime) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO tokens (
                access_handle, refresh_handle, client_id, user_id, scope,
                access_created_at, access_expires_at,
                refresh_created_at, refresh_expires_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (access_handle) DO UPDATE SET
                refresh_handle = EXCLUDED.refresh_handle,
                client_id = EXCLUDED.client_id,
                user_id = EXCLUDED.user_id,
                scope = EXCLUDED.scope,
                access_created_at = EXCLUDED.access_created_at,
                access_expires_at = EXCLUDED.access_expires_at,
                refresh_created_at = EXCLUDED.refresh_created_at,
                refresh_expires_at = EXCLUDED.refresh_expires_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.access_handle)
        .bind(&record.refresh_handle)
        .bind(&record.client_id)
        .bind(&record.user_id)
        .bind(&record.scope)
        .bind(record.access_created_at)
        .bind(record.access_expires_at)
        .bind(record.refresh_created_at)
        .bind(record.refresh_expires_at)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict(
                    "refresh handle already belongs to another token".to_string(),
                );
            }
            StorageError::from(e)
        })?;

        Ok(())
    }

    /// Find a record whose access window is live at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_live_by_access(
        &self,
        access_handle: &str,
        now: OffsetDateTime,
    ) -> StorageResult<Option<TokenRecord>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE access_handle = $1 AND access_expires_at > $2"
        );
        let row: Option<TokenTuple> = query_as(&sql)
            .bind(access_handle)
            .bind(now)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(record_from_tuple))
    }

    /// Find a record whose refresh window is live at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_live_by_refresh(
        &self,
        refresh_handle: &str,
        now: OffsetDateTime,
    ) -> StorageResult<Option<TokenRecord>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens \
             WHERE refresh_handle = $1 AND refresh_expires_at > $2"
        );
        let row: Option<TokenTuple> = query_as(&sql)
            .bind(refresh_handle)
            .bind(now)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(record_from_tuple))
    }

    /// Delete by access handle. Returns rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_by_access(&self, access_handle: &str) -> StorageResult<u64> {
        let result = query("DELETE FROM tokens WHERE access_handle = $1")
            .bind(access_handle)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete by refresh handle. Returns rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_by_refresh(&self, refresh_handle: &str) -> StorageResult<u64> {
        let result = query("DELETE FROM tokens WHERE refresh_handle = $1")
            .bind(refresh_handle)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete rows whose access and refresh windows have both elapsed at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_expired(&self, now: OffsetDateTime) -> StorageResult<u64> {
        let result = query(
            r#"
            DELETE FROM tokens
            WHERE access_expires_at <= $1
              AND (refresh_expires_at IS NULL OR refresh_expires_at <= $1)
            "#,
        )
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Count rows in one pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn counts(&self, now: OffsetDateTime) -> StorageResult<TokenCounts> {
        let (total, active, with_refresh): (i64, i64, i64) = query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE access_expires_at > $1),
                COUNT(refresh_handle)
            FROM tokens
            "#,
        )
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(TokenCounts {
            total,
            active,
            with_refresh,
        })
    }
}
