//! Hardened token store decorator.
//!
//! [`AuditedTokenStore`] wraps any [`TokenStore`] and adds:
//!
//! - A timeout on every call; an elapsed timeout becomes `AuthError::Transient`
//! - Structured audit events for create, remove and sweep with row counts
//! - Debug-level lookup tracing that only ever shows a short handle prefix

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::AuthResult;
use crate::config::StoreConfig;
use crate::error::AuthError;
use crate::storage::TokenStore;
use crate::types::{TokenRecord, TokenStats, redact_handle};

/// Per-operation time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeouts {
    /// Point lookups and removals.
    pub lookup: Duration,
    /// Writes and stats.
    pub write: Duration,
    /// Expiry sweep.
    pub sweep: Duration,
}

impl Default for StoreTimeouts {
    fn default() -> Self {
        Self::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for StoreTimeouts {
    fn from(config: &StoreConfig) -> Self {
        Self {
            lookup: config.lookup_timeout,
            write: config.write_timeout,
            sweep: config.sweep_timeout,
        }
    }
}

/// Token store with bounded calls and audit logging.
pub struct AuditedTokenStore {
    inner: Arc<dyn TokenStore>,
    timeouts: StoreTimeouts,
}

impl AuditedTokenStore {
    /// Wraps `inner` with the given limits.
    #[must_use]
    pub fn new(inner: Arc<dyn TokenStore>, timeouts: StoreTimeouts) -> Self {
        Self { inner, timeouts }
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn timeouts(&self) -> StoreTimeouts {
        self.timeouts
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        limit: Duration,
        call: impl Future<Output = AuthResult<T>> + Send,
    ) -> AuthResult<T> {
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, category = %e.category(), "Token store operation failed");
                Err(e)
            }
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = limit.as_millis() as u64,
                    "Token store operation timed out"
                );
                Err(AuthError::transient(format!(
                    "{} timed out after {:?}",
                    operation, limit
                )))
            }
        }
    }
}

#[async_trait]
impl TokenStore for AuditedTokenStore {
    async fn create(&self, record: &TokenRecord) -> AuthResult<()> {
        self.bounded("create", self.timeouts.write, self.inner.create(record))
            .await?;

        info!(
            access = redact_handle(&record.access_handle),
            client_id = %record.client_id,
            user_id = %record.user_id,
            has_refresh = record.refresh_handle.is_some(),
            access_expires_at = %record.access_expires_at,
            "Token record stored"
        );
        Ok(())
    }

    async fn get_by_access(&self, access_handle: &str) -> AuthResult<Option<TokenRecord>> {
        let found = self
            .bounded(
                "get_by_access",
                self.timeouts.lookup,
                self.inner.get_by_access(access_handle),
            )
            .await?;

        debug!(
            access = redact_handle(access_handle),
            found = found.is_some(),
            "Token lookup by access handle"
        );
        Ok(found)
    }

    async fn get_by_refresh(&self, refresh_handle: &str) -> AuthResult<Option<TokenRecord>> {
        let found = self
            .bounded(
                "get_by_refresh",
                self.timeouts.lookup,
                self.inner.get_by_refresh(refresh_handle),
            )
            .await?;

        debug!(
            refresh = redact_handle(refresh_handle),
            found = found.is_some(),
            "Token lookup by refresh handle"
        );
        Ok(found)
    }

    async fn remove_by_access(&self, access_handle: &str) -> AuthResult<u64> {
        let rows = self
            .bounded(
                "remove_by_access",
                self.timeouts.lookup,
                self.inner.remove_by_access(access_handle),
            )
            .await?;

        info!(
            access = redact_handle(access_handle),
            rows_affected = rows,
            "Token record removed by access handle"
        );
        Ok(rows)
    }

    async fn remove_by_refresh(&self, refresh_handle: &str) -> AuthResult<u64> {
        let rows = self
            .bounded(
                "remove_by_refresh",
                self.timeouts.lookup,
                self.inner.remove_by_refresh(refresh_handle),
            )
            .await?;

        info!(
            refresh = redact_handle(refresh_handle),
            rows_affected = rows,
            "Token record removed by refresh handle"
        );
        Ok(rows)
    }

    async fn get_by_code(&self, code: &str) -> AuthResult<Option<TokenRecord>> {
        self.inner.get_by_code(code).await
    }

    async fn remove_by_code(&self, code: &str) -> AuthResult<()> {
        self.inner.remove_by_code(code).await
    }

    async fn clean_expired_tokens(&self) -> AuthResult<u64> {
        let rows = self
            .bounded(
                "clean_expired_tokens",
                self.timeouts.sweep,
                self.inner.clean_expired_tokens(),
            )
            .await?;

        info!(rows_affected = rows, "Expired token records swept");
        Ok(rows)
    }

    async fn get_stats(&self) -> AuthResult<TokenStats> {
        let stats = self
            .bounded("get_stats", self.timeouts.write, self.inner.get_stats())
            .await?;

        debug!(
            total = stats.total,
            active = stats.active,
            expired = stats.expired,
            with_refresh = stats.with_refresh,
            "Token store stats"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::InMemoryTokenStore;
    use time::OffsetDateTime;
    use time::macros::datetime;
    use tokio_test::assert_ok;

    const T0: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    /// Backend that never answers lookups in time.
    struct StalledStore;

    #[async_trait]
    impl TokenStore for StalledStore {
        async fn create(&self, _record: &TokenRecord) -> AuthResult<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }

        async fn get_by_access(&self, _handle: &str) -> AuthResult<Option<TokenRecord>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }

        async fn get_by_refresh(&self, _handle: &str) -> AuthResult<Option<TokenRecord>> {
            Err(AuthError::transient("connection refused"))
        }

        async fn remove_by_access(&self, _handle: &str) -> AuthResult<u64> {
            Ok(0)
        }

        async fn remove_by_refresh(&self, _handle: &str) -> AuthResult<u64> {
            Ok(0)
        }

        async fn clean_expired_tokens(&self) -> AuthResult<u64> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(0)
        }

        async fn get_stats(&self) -> AuthResult<TokenStats> {
            Ok(TokenStats::default())
        }
    }

    fn short_timeouts() -> StoreTimeouts {
        StoreTimeouts {
            lookup: Duration::from_millis(20),
            write: Duration::from_millis(20),
            sweep: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_timeouts_from_config() {
        let timeouts = StoreTimeouts::default();
        assert_eq!(timeouts.lookup, Duration::from_secs(3));
        assert_eq!(timeouts.write, Duration::from_secs(5));
        assert_eq!(timeouts.sweep, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_stalled_lookup_becomes_transient() {
        let store = AuditedTokenStore::new(Arc::new(StalledStore), short_timeouts());

        let err = store.get_by_access("eyJhbGciOi").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("get_by_access"));

        let err = store
            .create(&TokenRecord::new(
                "a1",
                "c1",
                "u1",
                "",
                T0,
                Duration::from_secs(60),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Transient { .. }));

        assert!(store.clean_expired_tokens().await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_inner_errors_keep_their_kind() {
        let store = AuditedTokenStore::new(Arc::new(StalledStore), short_timeouts());
        let err = store.get_by_refresh("r1").await.unwrap_err();
        assert!(matches!(err, AuthError::Transient { ref message } if message == "connection refused"));
    }

    #[tokio::test]
    async fn test_delegates_to_inner_store() {
        let clock = Arc::new(ManualClock::new(T0));
        let inner = Arc::new(InMemoryTokenStore::new(clock.clone()));
        let store = AuditedTokenStore::new(inner.clone(), StoreTimeouts::default());

        let record = TokenRecord::new("a1", "c1", "u1", "read", T0, Duration::from_secs(60))
            .with_refresh("r1", T0, Duration::from_secs(3600));
        assert_ok!(store.create(&record).await);
        assert_eq!(inner.len().await, 1);

        assert!(store.get_by_access("a1").await.unwrap().is_some());
        assert!(store.get_by_refresh("r1").await.unwrap().is_some());
        assert_eq!(store.get_stats().await.unwrap().with_refresh, 1);
        assert!(store.get_by_code("code").await.unwrap().is_none());

        assert_eq!(store.remove_by_refresh("r1").await.unwrap(), 1);
        assert_eq!(store.remove_by_access("a1").await.unwrap(), 0);

        clock.advance(Duration::from_secs(3600));
        assert_eq!(store.clean_expired_tokens().await.unwrap(), 0);
    }
}
