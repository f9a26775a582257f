//! Signed access tokens.
//!
//! Access tokens are HS256 JWTs carrying `{aud, sub, iat, exp}`. The refresh
//! handle issued alongside is derived from the signed token itself, so it is
//! stable for a given access token and reveals nothing about the secret.
//!
//! ## Example
//!
//! ```ignore
//! use tollgate_auth::token::jwt::SignedTokenCodec;
//!
//! let codec = SignedTokenCodec::new(secret, clock)?;
//! let minted = codec.mint("c1", "u1", Duration::from_secs(60), true)?;
//! let claims = codec.decode(&minted.access_token)?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::clock::Clock;
use crate::config::{MIN_SIGNING_SECRET_LEN, SigningConfig};
use crate::error::AuthError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if the token was well-formed but failed verification.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::InvalidSignature | Self::InvalidClaims { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::decoding_error(err.to_string()),
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError { message } => AuthError::internal(message),
            JwtError::InvalidKey { message } => AuthError::configuration(message),
            other => AuthError::invalid_token(other.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by a signed access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedClaims {
    /// Audience: the client the token was issued to.
    pub aud: String,
    /// Subject: the user the token was issued for.
    pub sub: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expires at (Unix seconds).
    pub exp: i64,
}

impl SignedClaims {
    /// Returns the expiry as a timestamp.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidClaims` if `exp` is outside the representable range.
    pub fn expires_at(&self) -> Result<OffsetDateTime, JwtError> {
        OffsetDateTime::from_unix_timestamp(self.exp)
            .map_err(|e| JwtError::invalid_claims(format!("exp out of range: {e}")))
    }
}

/// Output of a single mint.
#[derive(Clone)]
pub struct MintedToken {
    /// The signed access token.
    pub access_token: String,
    /// Refresh handle derived from the access token, when requested.
    pub refresh_handle: Option<String>,
    /// Issue time, truncated to whole seconds.
    pub issued_at: OffsetDateTime,
    /// `issued_at` plus the access TTL.
    pub expires_at: OffsetDateTime,
}

impl fmt::Debug for MintedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintedToken")
            .field("access_token", &"<redacted>")
            .field("has_refresh", &self.refresh_handle.is_some())
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Mints and verifies HS256 access tokens.
///
/// Thread-safe (`Send + Sync`); share one instance behind an `Arc`.
pub struct SignedTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl SignedTokenCodec {
    /// Creates a codec from a raw secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the secret is empty or shorter
    /// than 32 bytes.
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::configuration("signing secret is not set"));
        }
        if secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(AuthError::configuration(format!(
                "signing secret must be at least {} bytes, got {}",
                MIN_SIGNING_SECRET_LEN,
                secret.len()
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            clock,
        })
    }

    /// Creates a codec from the `signing` config section.
    ///
    /// # Errors
    ///
    /// See [`SignedTokenCodec::new`].
    pub fn from_config(config: &SigningConfig, clock: Arc<dyn Clock>) -> AuthResult<Self> {
        Self::new(config.secret.as_bytes(), clock)
    }

    /// Mints a signed access token for `client_id` acting for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if signing fails or the TTL overflows.
    pub fn mint(
        &self,
        client_id: &str,
        user_id: &str,
        access_ttl: Duration,
        want_refresh: bool,
    ) -> Result<MintedToken, JwtError> {
        let iat = self.clock.now().unix_timestamp();
        let ttl = i64::try_from(access_ttl.as_secs())
            .map_err(|_| JwtError::encoding_error("access TTL out of range"))?;
        let exp = iat
            .checked_add(ttl)
            .ok_or_else(|| JwtError::encoding_error("access TTL out of range"))?;

        let claims = SignedClaims {
            aud: client_id.to_string(),
            sub: user_id.to_string(),
            iat,
            exp,
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))?;

        let issued_at = OffsetDateTime::from_unix_timestamp(iat)
            .map_err(|e| JwtError::encoding_error(e.to_string()))?;
        let expires_at = claims
            .expires_at()
            .map_err(|e| JwtError::encoding_error(e.to_string()))?;

        let refresh_handle = want_refresh.then(|| derive_refresh_handle(&access_token));

        Ok(MintedToken {
            access_token,
            refresh_handle,
            issued_at,
            expires_at,
        })
    }

    /// Verifies the signature and returns the claims.
    ///
    /// Only HS256 is accepted. `exp`, `sub` and `aud` are required; expiry
    /// is checked against the injected clock, not the wall clock.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` when `exp <= now`, and the matching
    /// variant for any signature, algorithm or claim failure.
    pub fn decode(&self, token: &str) -> Result<SignedClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false; // checked below against the injected clock
        validation.validate_aud = false; // any client may be the audience
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        let data = decode::<SignedClaims>(token, &self.decoding_key, &validation)?;
        if data.claims.exp <= self.clock.now().unix_timestamp() {
            return Err(JwtError::Expired);
        }
        Ok(data.claims)
    }
}

impl fmt::Debug for SignedTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedTokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Derives the refresh handle for a signed access token.
///
/// SHA-256 of the token bytes, base64url-encoded with padding.
#[must_use]
pub fn derive_refresh_handle(access_token: &str) -> String {
    URL_SAFE.encode(Sha256::digest(access_token.as_bytes()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use time::macros::datetime;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const T0: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    fn codec_at(clock: Arc<ManualClock>) -> SignedTokenCodec {
        SignedTokenCodec::new(SECRET, clock).unwrap()
    }

    #[test]
    fn test_short_secret_is_fatal() {
        let clock = Arc::new(ManualClock::new(T0));

        let err = SignedTokenCodec::new(b"", clock.clone()).unwrap_err();
        assert!(err.is_fatal());

        let err = SignedTokenCodec::new(b"too-short", clock).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn test_mint_sets_claims_from_clock() {
        let clock = Arc::new(ManualClock::new(T0));
        let codec = codec_at(clock);

        let minted = codec
            .mint("c1", "u1", Duration::from_secs(60), false)
            .unwrap();
        assert!(minted.access_token.starts_with("eyJ"));
        assert_eq!(minted.access_token.split('.').count(), 3);
        assert!(minted.refresh_handle.is_none());
        assert_eq!(minted.issued_at, T0);
        assert_eq!(minted.expires_at, T0 + time::Duration::seconds(60));

        let claims = codec.decode(&minted.access_token).unwrap();
        assert_eq!(claims.aud, "c1");
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.iat, T0.unix_timestamp());
        assert_eq!(claims.exp, T0.unix_timestamp() + 60);
    }

    #[test]
    fn test_refresh_handle_is_hash_of_access_token() {
        let clock = Arc::new(ManualClock::new(T0));
        let minted = codec_at(clock)
            .mint("c1", "u1", Duration::from_secs(60), true)
            .unwrap();

        let refresh = minted.refresh_handle.unwrap();
        assert_eq!(refresh, derive_refresh_handle(&minted.access_token));
        // 32 bytes -> 44 padded base64 chars
        assert_eq!(refresh.len(), 44);
        assert!(refresh.ends_with('='));
        assert!(!refresh.contains('+') && !refresh.contains('/'));
    }

    #[test]
    fn test_mints_differ_across_seconds() {
        let clock = Arc::new(ManualClock::new(T0));
        let codec = codec_at(clock.clone());

        let first = codec.mint("c1", "u1", Duration::from_secs(60), true).unwrap();
        clock.advance(Duration::from_secs(1));
        let second = codec.mint("c1", "u1", Duration::from_secs(60), true).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_handle, second.refresh_handle);
    }

    #[test]
    fn test_expiry_checked_against_injected_clock() {
        let clock = Arc::new(ManualClock::new(T0));
        let codec = codec_at(clock.clone());
        let minted = codec.mint("c1", "u1", Duration::from_secs(60), false).unwrap();

        clock.advance(Duration::from_secs(59));
        assert!(codec.decode(&minted.access_token).is_ok());

        clock.advance(Duration::from_secs(1));
        assert!(matches!(
            codec.decode(&minted.access_token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let clock = Arc::new(ManualClock::new(T0));
        let codec = codec_at(clock.clone());
        let other =
            SignedTokenCodec::new(b"fedcba9876543210fedcba9876543210", clock).unwrap();

        let minted = other.mint("c1", "u1", Duration::from_secs(60), false).unwrap();
        let err = codec.decode(&minted.access_token).unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_wrong_algorithm_rejected() {
        let clock = Arc::new(ManualClock::new(T0));
        let codec = codec_at(clock);

        let claims = SignedClaims {
            aud: "c1".into(),
            sub: "u1".into(),
            iat: T0.unix_timestamp(),
            exp: T0.unix_timestamp() + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(codec.decode(&token).is_err());
    }

    #[test]
    fn test_missing_claims_rejected() {
        let clock = Arc::new(ManualClock::new(T0));
        let codec = codec_at(clock);

        #[derive(Serialize)]
        struct NoAudience {
            sub: String,
            exp: i64,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoAudience {
                sub: "u1".into(),
                exp: T0.unix_timestamp() + 60,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(codec.decode(&token).is_err());
    }

    #[test]
    fn test_jwt_error_maps_to_auth_error() {
        let err: AuthError = JwtError::InvalidSignature.into();
        assert!(matches!(err, AuthError::InvalidToken { .. }));

        let err: AuthError = JwtError::invalid_key("bad").into();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_debug_hides_token() {
        let clock = Arc::new(ManualClock::new(T0));
        let minted = codec_at(clock)
            .mint("c1", "u1", Duration::from_secs(60), true)
            .unwrap();

        let debug = format!("{minted:?}");
        assert!(!debug.contains(&minted.access_token));
        assert!(debug.contains("<redacted>"));
    }
}
