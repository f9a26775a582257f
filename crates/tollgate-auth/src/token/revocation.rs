//! Token revocation (RFC 7009)
//!
//! Revocation removes the token record by both of its handles. The hint only
//! decides which handle is tried first; an unknown token is still success.
//!
//! # References
//!
//! - [RFC 7009 - OAuth 2.0 Token Revocation](https://tools.ietf.org/html/rfc7009)

use serde::{Deserialize, Serialize};

/// Token type hint for revocation requests.
///
/// Indicates whether the token being revoked is an access token or refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    /// The token is an access token.
    AccessToken,
    /// The token is a refresh token.
    RefreshToken,
}

impl TokenTypeHint {
    /// Returns the token type hint as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Handle kinds to try, most likely first.
    ///
    /// Without a hint, the refresh handle goes first.
    #[must_use]
    pub fn removal_order(hint: Option<Self>) -> [Self; 2] {
        match hint {
            Some(Self::AccessToken) => [Self::AccessToken, Self::RefreshToken],
            Some(Self::RefreshToken) | None => [Self::RefreshToken, Self::AccessToken],
        }
    }
}

impl std::fmt::Display for TokenTypeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
