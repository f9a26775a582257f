//! Token generation, validation, and management.
//!
//! This module provides:
//!
//! - Signed access token minting and verification
//! - Refresh handle derivation and rotation
//! - Token introspection (RFC 7662)
//! - Token revocation (RFC 7009)

pub mod introspection;
pub mod jwt;
pub mod revocation;
pub mod service;

pub use introspection::{IntrospectionResolver, IntrospectionResponse, looks_like_signed_token};
pub use jwt::{JwtError, MintedToken, SignedClaims, SignedTokenCodec, derive_refresh_handle};
pub use revocation::TokenTypeHint;
pub use service::{IssuedTokens, TokenService};
