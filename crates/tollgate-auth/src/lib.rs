//! # tollgate-auth
//!
//! Token lifecycle and introspection core for the Tollgate authorization
//! service.
//!
//! This crate provides:
//! - Signed (HS256) access tokens with derived refresh handles
//! - A token record store trait with in-memory and hardened implementations
//! - Token introspection that fails closed
//! - Password and client-secret verification
//! - A write-through client directory
//!
//! ## Modules
//!
//! - [`config`] - Layered configuration (file, environment, `.env`)
//! - [`clock`] - Injectable time source
//! - [`credentials`] - User and client verification
//! - [`directory`] - Cached client lookup
//! - [`storage`] - Storage traits and in-process implementations
//! - [`token`] - Minting, introspection, refresh and revocation
//! - [`observability`] - Tracing subscriber setup
//!
//! PostgreSQL persistence lives in the `tollgate-auth-postgres` crate.

pub mod clock;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod observability;
pub mod storage;
pub mod token;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, ConfigError, StoreMode, load_config};
pub use credentials::{CredentialVerifier, PasswordAuthorizationHandler};
pub use directory::ClientDirectory;
pub use error::{AuthError, ErrorCategory};
pub use storage::{
    AuditedTokenStore, ClientStorage, InMemoryClientStorage, InMemoryTokenStore,
    InMemoryUserStorage, TokenStore, UserStorage, build_token_store,
};
pub use token::{
    IntrospectionResolver, IntrospectionResponse, IssuedTokens, JwtError, SignedTokenCodec,
    TokenService, TokenTypeHint,
};
pub use types::{ClientCredential, TokenRecord, TokenStats, UserCredential};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tollgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{AuthConfig, ConfigError, StoreConfig, StoreMode, TokenConfig};
    pub use crate::credentials::{CredentialVerifier, PasswordAuthorizationHandler};
    pub use crate::directory::ClientDirectory;
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::storage::{ClientStorage, TokenStore, UserStorage, build_token_store};
    pub use crate::token::{
        IntrospectionResolver, IntrospectionResponse, IssuedTokens, SignedTokenCodec,
        TokenService, TokenTypeHint,
    };
    pub use crate::types::{ClientCredential, TokenRecord, TokenStats, UserCredential};
}
