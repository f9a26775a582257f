//! Token introspection (RFC 7662)
//!
//! Answers "is this token active, and for whom?" for both token shapes the
//! service hands out:
//!
//! - Signed access tokens are verified locally, no store round-trip
//! - Anything else is treated as an opaque handle and looked up in the
//!   token store
//!
//! # Security Considerations
//!
//! - The shape test only picks a branch; it is never a trust decision
//! - Never reveal why a token is inactive (expired vs revoked vs invalid)
//! - Store failures are logged and reported as inactive
//!
//! # References
//!
//! - [RFC 7662 - OAuth 2.0 Token Introspection](https://tools.ietf.org/html/rfc7662)

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::jwt::SignedTokenCodec;
use crate::clock::Clock;
use crate::storage::TokenStore;
use crate::types::redact_handle;

/// Tokens at or above this length always take the opaque branch.
pub const MAX_SIGNED_TOKEN_LEN: usize = 2048;

/// base64url encoding of `{"`, the start of every JSON JWT header.
const SIGNED_TOKEN_PREFIX: &str = "eyJ";

// =============================================================================
// Response Types
// =============================================================================

/// Token introspection response.
///
/// If the token is invalid, expired, revoked, or unknown, the response
/// only contains `active: false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active.
    pub active: bool,

    /// Client the token was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// User the token acts for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Granted scope. Only known for opaque handles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Expiration time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IntrospectionResponse {
    /// Creates an inactive response.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Creates an active response for a client and user.
    #[must_use]
    pub fn active(client_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            active: true,
            client_id: Some(client_id.into()),
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Sets the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub fn with_exp(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }
}

/// Cheap structural test that routes a token to the signed branch.
///
/// True when the token is non-empty, shorter than
/// [`MAX_SIGNED_TOKEN_LEN`] bytes, starts with `eyJ` and has exactly three
/// dot-separated segments.
#[must_use]
pub fn looks_like_signed_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() < MAX_SIGNED_TOKEN_LEN
        && token.starts_with(SIGNED_TOKEN_PREFIX)
        && token.split('.').count() == 3
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves a presented token to an [`IntrospectionResponse`].
///
/// Never returns an error: every failure collapses to inactive.
pub struct IntrospectionResolver {
    codec: Arc<SignedTokenCodec>,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl IntrospectionResolver {
    /// Creates a resolver over the given codec and store.
    #[must_use]
    pub fn new(
        codec: Arc<SignedTokenCodec>,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec,
            store,
            clock,
        }
    }

    /// Introspects `token`.
    pub async fn resolve(&self, token: &str) -> IntrospectionResponse {
        if looks_like_signed_token(token) {
            self.resolve_signed(token)
        } else {
            self.resolve_opaque(token).await
        }
    }

    fn resolve_signed(&self, token: &str) -> IntrospectionResponse {
        match self.codec.decode(token) {
            Ok(claims) => IntrospectionResponse::active(claims.aud, claims.sub).with_exp(claims.exp),
            Err(e) => {
                debug!(error = %e, "Signed token rejected");
                IntrospectionResponse::inactive()
            }
        }
    }

    async fn resolve_opaque(&self, token: &str) -> IntrospectionResponse {
        let record = match self.store.get_by_access(token).await {
            Ok(Some(record)) => record,
            Ok(None) => return IntrospectionResponse::inactive(),
            Err(e) => {
                warn!(
                    access = redact_handle(token),
                    error = %e,
                    retryable = e.is_retryable(),
                    "Token store lookup failed during introspection"
                );
                return IntrospectionResponse::inactive();
            }
        };

        let expires_at = record.access_created_at + record.access_expires_in();
        if expires_at <= self.clock.now() {
            return IntrospectionResponse::inactive();
        }

        IntrospectionResponse::active(record.client_id, record.user_id)
            .with_scope(record.scope)
            .with_exp(expires_at.unix_timestamp())
    }
}
