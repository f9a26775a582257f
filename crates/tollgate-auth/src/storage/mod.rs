//! Storage traits for authentication data.
//!
//! This module defines storage interfaces for:
//!
//! - Issued token records (access and refresh handles)
//! - OAuth client credentials
//! - Password-authenticated users
//!
//! # Implementations
//!
//! - [`memory`] - process-local stores for development and tests
//! - `tollgate-auth-postgres` - PostgreSQL storage backend
//!
//! Token stores are composed once at startup by [`build_token_store`]; the
//! rest of the crate only ever sees `Arc<dyn TokenStore>`.

pub mod audited;
pub mod client;
pub mod memory;
pub mod token;
pub mod user;

use std::sync::Arc;

use tracing::info;

use crate::config::{StoreConfig, StoreMode};

pub use audited::{AuditedTokenStore, StoreTimeouts};
pub use client::ClientStorage;
pub use memory::{InMemoryClientStorage, InMemoryTokenStore, InMemoryUserStorage};
pub use token::TokenStore;
pub use user::UserStorage;

/// Composes the token store for the configured mode.
///
/// `Minimal` hands back the backend unchanged; `Hardened` wraps it in an
/// [`AuditedTokenStore`] with the configured per-operation timeouts.
#[must_use]
pub fn build_token_store(config: &StoreConfig, backend: Arc<dyn TokenStore>) -> Arc<dyn TokenStore> {
    match config.mode {
        StoreMode::Minimal => {
            info!(mode = "minimal", "Token store configured");
            backend
        }
        StoreMode::Hardened => {
            let timeouts = StoreTimeouts::from(config);
            info!(
                mode = "hardened",
                lookup_timeout_ms = timeouts.lookup.as_millis() as u64,
                write_timeout_ms = timeouts.write.as_millis() as u64,
                sweep_timeout_ms = timeouts.sweep.as_millis() as u64,
                "Token store configured"
            );
            Arc::new(AuditedTokenStore::new(backend, timeouts))
        }
    }
}
