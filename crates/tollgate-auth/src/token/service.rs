//! Token service for issuing, refreshing and revoking tokens.
//!
//! This module provides the service that handles the token lifecycle:
//!
//! - Issuing a signed access token plus optional refresh handle
//! - The resource owner password grant
//! - Refresh handle exchange with rotation
//! - Revocation by either handle
//!
//! # Usage
//!
//! ```ignore
//! use tollgate_auth::token::TokenService;
//!
//! let service = TokenService::new(codec, store, verifier, config.tokens.clone());
//! let issued = service.password_grant("c1", "secret", "alice", "pw", "read").await?;
//! let rotated = service.refresh("c1", issued.refresh_token.as_deref().unwrap()).await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::AuthResult;
use crate::config::TokenConfig;
use crate::credentials::CredentialVerifier;
use crate::error::AuthError;
use crate::storage::TokenStore;
use crate::token::jwt::SignedTokenCodec;
use crate::token::revocation::TokenTypeHint;
use crate::types::{TokenRecord, redact_handle, window_end};

/// Token endpoint response (RFC 6749 section 5.1).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokens {
    /// The signed access token.
    pub access_token: String,

    /// Always `"Bearer"`.
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Refresh handle, when refresh issuance is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scope, passed through unmodified.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

impl fmt::Debug for IssuedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedTokens")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh", &self.refresh_token.is_some())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Issues and manages tokens.
pub struct TokenService {
    /// Codec for minting signed access tokens.
    codec: Arc<SignedTokenCodec>,

    /// Record store for issued tokens.
    store: Arc<dyn TokenStore>,

    /// Client and user verification.
    verifier: Arc<CredentialVerifier>,

    /// Lifetimes and refresh issuance.
    config: TokenConfig,
}

impl TokenService {
    /// Creates a new token service.
    #[must_use]
    pub fn new(
        codec: Arc<SignedTokenCodec>,
        store: Arc<dyn TokenStore>,
        verifier: Arc<CredentialVerifier>,
        config: TokenConfig,
    ) -> Self {
        Self {
            codec,
            store,
            verifier,
            config,
        }
    }

    /// Mints a token pair for `client_id` acting for `user_id` and stores
    /// the record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if a configured lifetime cannot
    /// produce a usable window, `AuthError::Internal` if minting fails, or
    /// the store error.
    pub async fn issue(&self, client_id: &str, user_id: &str, scope: &str) -> AuthResult<IssuedTokens> {
        let access_ttl = whole_seconds(self.config.access_token_lifetime);
        if access_ttl.is_zero() {
            return Err(AuthError::configuration(
                "tokens.access_token_lifetime must be at least 1s",
            ));
        }
        let minted = self.codec.mint(
            client_id,
            user_id,
            access_ttl,
            self.config.issue_refresh_tokens,
        )?;

        let mut record = TokenRecord::new(
            minted.access_token.clone(),
            client_id,
            user_id,
            scope,
            minted.issued_at,
            access_ttl,
        );
        if let Some(refresh) = &minted.refresh_handle {
            if window_end(minted.issued_at, self.config.refresh_token_lifetime).is_none() {
                return Err(AuthError::configuration(
                    "tokens.refresh_token_lifetime is out of range",
                ));
            }
            record = record.with_refresh(
                refresh.clone(),
                minted.issued_at,
                self.config.refresh_token_lifetime,
            );
        }
        self.store.create(&record).await?;

        info!(
            client_id,
            user_id,
            access = redact_handle(&minted.access_token),
            has_refresh = minted.refresh_handle.is_some(),
            "Tokens issued"
        );

        Ok(IssuedTokens {
            access_token: minted.access_token,
            token_type: "Bearer".to_string(),
            expires_in: access_ttl.as_secs(),
            refresh_token: minted.refresh_handle,
            scope: scope.to_string(),
        })
    }

    /// Resource owner password grant.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClient` or `AuthError::InvalidCredentials`
    /// for bad credentials, or any error from [`TokenService::issue`].
    pub async fn password_grant(
        &self,
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
        scope: &str,
    ) -> AuthResult<IssuedTokens> {
        let client = self.verifier.verify_client(client_id, client_secret).await?;
        let user = self.verifier.verify_user(username, password).await?;
        self.issue(&client.id, &user.id, scope).await
    }

    /// Exchanges a refresh handle for a new token pair.
    ///
    /// The old record is removed before the new pair is issued and only the
    /// caller whose removal deletes it gets a new pair, so a refresh handle
    /// can only be used once. The original scope carries over.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidGrant` if the handle is unknown, expired or
    /// was issued to another client.
    pub async fn refresh(&self, client_id: &str, refresh_handle: &str) -> AuthResult<IssuedTokens> {
        let record = self
            .store
            .get_by_refresh(refresh_handle)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("invalid refresh token"))?;

        if record.client_id != client_id {
            debug!(
                client_id,
                refresh = redact_handle(refresh_handle),
                "Refresh handle presented by another client"
            );
            return Err(AuthError::invalid_grant("invalid refresh token"));
        }

        // Removal is the claim: of two concurrent redemptions only one
        // deletes the row.
        if self.store.remove_by_refresh(refresh_handle).await? == 0 {
            debug!(
                client_id,
                refresh = redact_handle(refresh_handle),
                "Refresh handle already redeemed"
            );
            return Err(AuthError::invalid_grant("invalid refresh token"));
        }
        self.issue(&record.client_id, &record.user_id, &record.scope)
            .await
    }

    /// Revokes a token by whichever handle it is.
    ///
    /// Unknown tokens are success.
    ///
    /// # Errors
    ///
    /// Returns the store error if a removal fails.
    pub async fn revoke(&self, token: &str, hint: Option<TokenTypeHint>) -> AuthResult<()> {
        let mut removed = 0;
        for kind in TokenTypeHint::removal_order(hint) {
            removed += match kind {
                TokenTypeHint::AccessToken => self.store.remove_by_access(token).await?,
                TokenTypeHint::RefreshToken => self.store.remove_by_refresh(token).await?,
            };
            if removed > 0 {
                break;
            }
        }

        debug!(
            token = redact_handle(token),
            hint = hint.map(|h| h.as_str()),
            removed,
            "Token revocation processed"
        );
        Ok(())
    }

    /// Returns the token configuration.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }
}

/// Signed tokens carry whole-second timestamps, so the record must too.
fn whole_seconds(ttl: Duration) -> Duration {
    Duration::from_secs(ttl.as_secs())
}
