//! Token record domain type.
//!
//! A [`TokenRecord`] is the unit persisted by a token store: one issued
//! access handle, its optional refresh handle, and the two validity windows.
//!
//! # Windows
//!
//! A window is live while its expiry is strictly after `now`, and has
//! elapsed once `expires_at <= now`. Stores, the sweep and the introspection
//! resolver all apply this same rule.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;

/// Number of leading characters of a handle that may appear in logs.
pub const LOGGED_HANDLE_PREFIX: usize = 8;

/// End of a window of length `ttl` starting at `start`.
///
/// Returns `None` when the end falls outside the representable calendar.
#[must_use]
pub fn window_end(start: OffsetDateTime, ttl: Duration) -> Option<OffsetDateTime> {
    start.checked_add(time::Duration::try_from(ttl).ok()?)
}

/// An issued token pair as persisted by a token store.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Primary lookup key.
    pub access_handle: String,

    /// Secondary lookup key, unique when present.
    pub refresh_handle: Option<String>,

    /// Client the tokens were issued to.
    pub client_id: String,

    /// User that authorized the grant.
    pub user_id: String,

    /// Granted scope, passed through unmodified.
    pub scope: String,

    /// Start of the access window.
    pub access_created_at: OffsetDateTime,

    /// End of the access window.
    pub access_expires_at: OffsetDateTime,

    /// Start of the refresh window; present iff `refresh_handle` is.
    pub refresh_created_at: Option<OffsetDateTime>,

    /// End of the refresh window; present iff `refresh_handle` is.
    pub refresh_expires_at: Option<OffsetDateTime>,

    /// Last write, stamped by the store.
    pub updated_at: OffsetDateTime,
}

impl TokenRecord {
    /// Creates a record with an access window of `access_ttl` and no refresh window.
    #[must_use]
    pub fn new(
        access_handle: impl Into<String>,
        client_id: impl Into<String>,
        user_id: impl Into<String>,
        scope: impl Into<String>,
        access_created_at: OffsetDateTime,
        access_ttl: Duration,
    ) -> Self {
        Self {
            access_handle: access_handle.into(),
            refresh_handle: None,
            client_id: client_id.into(),
            user_id: user_id.into(),
            scope: scope.into(),
            access_created_at,
            access_expires_at: access_created_at + access_ttl,
            refresh_created_at: None,
            refresh_expires_at: None,
            updated_at: access_created_at,
        }
    }

    /// Attaches a refresh window.
    ///
    /// An empty handle clears the refresh window instead, so a record can
    /// never carry a refresh expiry without a handle.
    #[must_use]
    pub fn with_refresh(
        mut self,
        refresh_handle: impl Into<String>,
        refresh_created_at: OffsetDateTime,
        refresh_ttl: Duration,
    ) -> Self {
        let handle = refresh_handle.into();
        if handle.is_empty() {
            self.refresh_handle = None;
            self.refresh_created_at = None;
            self.refresh_expires_at = None;
        } else {
            self.refresh_handle = Some(handle);
            self.refresh_created_at = Some(refresh_created_at);
            self.refresh_expires_at = Some(refresh_created_at + refresh_ttl);
        }
        self
    }

    /// Length of the access window.
    #[must_use]
    pub fn access_expires_in(&self) -> time::Duration {
        self.access_expires_at - self.access_created_at
    }

    /// Returns `true` while the access window is live at `now`.
    #[must_use]
    pub fn is_access_live(&self, now: OffsetDateTime) -> bool {
        self.access_expires_at > now
    }

    /// Returns `true` while a refresh window exists and is live at `now`.
    #[must_use]
    pub fn is_refresh_live(&self, now: OffsetDateTime) -> bool {
        self.refresh_expires_at.is_some_and(|exp| exp > now)
    }

    /// Returns `true` once both windows have elapsed at `now`.
    #[must_use]
    pub fn is_sweepable(&self, now: OffsetDateTime) -> bool {
        !self.is_access_live(now) && !self.is_refresh_live(now)
    }

    /// Checks the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` if the access handle is empty, the
    /// refresh handle is present but empty, the refresh window and handle
    /// disagree, or a window ends before it starts.
    pub fn validate(&self) -> AuthResult<()> {
        if self.access_handle.is_empty() {
            return Err(AuthError::invalid_request("access handle must not be empty"));
        }

        if self.refresh_handle.as_deref() == Some("") {
            return Err(AuthError::invalid_request(
                "refresh handle must be absent rather than empty",
            ));
        }

        let has_refresh = self.refresh_handle.is_some();
        if has_refresh != self.refresh_expires_at.is_some()
            || has_refresh != self.refresh_created_at.is_some()
        {
            return Err(AuthError::invalid_request(
                "refresh window must be present exactly when a refresh handle is",
            ));
        }

        if self.access_expires_at < self.access_created_at {
            return Err(AuthError::invalid_request(
                "access window ends before it starts",
            ));
        }

        if let (Some(created), Some(expires)) = (self.refresh_created_at, self.refresh_expires_at)
            && expires < created
        {
            return Err(AuthError::invalid_request(
                "refresh window ends before it starts",
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_handle", &redact_handle(&self.access_handle))
            .field(
                "refresh_handle",
                &self.refresh_handle.as_deref().map(redact_handle),
            )
            .field("client_id", &self.client_id)
            .field("user_id", &self.user_id)
            .field("scope", &self.scope)
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish_non_exhaustive()
    }
}

/// Returns the loggable prefix of a handle.
#[must_use]
pub fn redact_handle(handle: &str) -> &str {
    match handle.char_indices().nth(LOGGED_HANDLE_PREFIX) {
        Some((idx, _)) => &handle[..idx],
        None => handle,
    }
}

/// Point-in-time token store counts.
///
/// Counts are gathered without snapshot isolation and may be slightly
/// inconsistent under concurrent writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenStats {
    /// Rows present, regardless of expiry.
    pub total: u64,
    /// Rows whose access window is live.
    pub active: u64,
    /// Rows whose access window has elapsed.
    pub expired: u64,
    /// Rows carrying a refresh handle.
    pub with_refresh: u64,
}

impl TokenStats {
    /// Builds stats from raw counts; `expired` is derived.
    #[must_use]
    pub fn new(total: u64, active: u64, with_refresh: u64) -> Self {
        Self {
            total,
            active,
            expired: total.saturating_sub(active),
            with_refresh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    fn record() -> TokenRecord {
        TokenRecord::new("access-1", "c1", "u1", "read", T0, Duration::from_secs(60))
    }

    #[test]
    fn test_window_end_overflow() {
        assert_eq!(
            window_end(T0, Duration::from_secs(60)),
            Some(datetime!(2026-03-01 12:01 UTC))
        );
        let huge = Duration::from_secs(400_000 * 365 * 86_400);
        assert_eq!(window_end(T0, huge), None);
        assert_eq!(window_end(T0, Duration::MAX), None);
    }

    #[test]
    fn test_new_sets_access_window() {
        let r = record();
        assert_eq!(r.access_expires_at, datetime!(2026-03-01 12:01 UTC));
        assert_eq!(r.access_expires_in(), time::Duration::seconds(60));
        assert!(r.refresh_handle.is_none());
        assert!(r.refresh_expires_at.is_none());
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_with_refresh_sets_both_fields() {
        let r = record().with_refresh("refresh-1", T0, Duration::from_secs(3600));
        assert_eq!(r.refresh_handle.as_deref(), Some("refresh-1"));
        assert_eq!(r.refresh_expires_at, Some(datetime!(2026-03-01 13:00 UTC)));
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_empty_refresh_handle_means_no_refresh_window() {
        let r = record().with_refresh("", T0, Duration::from_secs(3600));
        assert!(r.refresh_handle.is_none());
        assert!(r.refresh_created_at.is_none());
        assert!(r.refresh_expires_at.is_none());
    }

    #[test]
    fn test_validate_rejects_inconsistent_windows() {
        let mut r = record();
        r.refresh_expires_at = Some(T0);
        assert!(matches!(
            r.validate(),
            Err(AuthError::InvalidRequest { .. })
        ));

        let mut r = record();
        r.refresh_handle = Some(String::new());
        assert!(r.validate().is_err());

        let mut r = record();
        r.access_handle.clear();
        assert!(r.validate().is_err());

        let mut r = record();
        r.access_expires_at = T0 - time::Duration::seconds(1);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_window_boundaries() {
        let r = record().with_refresh("refresh-1", T0, Duration::from_secs(3600));
        let access_end = r.access_expires_at;

        assert!(r.is_access_live(access_end - time::Duration::seconds(1)));
        assert!(!r.is_access_live(access_end));
        assert!(r.is_refresh_live(access_end));
        assert!(!r.is_sweepable(access_end));
        assert!(r.is_sweepable(datetime!(2026-03-01 13:00 UTC)));
    }

    #[test]
    fn test_record_without_refresh_is_sweepable_after_access() {
        let r = record();
        assert!(!r.is_sweepable(T0));
        assert!(r.is_sweepable(datetime!(2026-03-01 12:01 UTC)));
    }

    #[test]
    fn test_redact_handle() {
        assert_eq!(redact_handle("eyJhbGciOiJIUzI1NiJ9"), "eyJhbGci");
        assert_eq!(redact_handle("short"), "short");
        assert_eq!(redact_handle(""), "");
    }

    #[test]
    fn test_debug_redacts_handles() {
        let r = record().with_refresh("refresh-handle-value", T0, Duration::from_secs(60));
        let rendered = format!("{:?}", r);
        assert!(!rendered.contains("refresh-handle-value"));
        assert!(rendered.contains("refresh-"));
    }

    #[test]
    fn test_stats_derive_expired() {
        let stats = TokenStats::new(10, 7, 4);
        assert_eq!(stats.expired, 3);
        assert_eq!(TokenStats::new(1, 3, 0).expired, 0);
    }
}
