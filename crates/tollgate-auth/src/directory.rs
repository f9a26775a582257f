//! Client directory.
//!
//! A concurrent in-memory map in front of durable client storage. The map is
//! filled only by [`ClientDirectory::register`]; a cold resolve reads storage
//! and leaves the map untouched.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ClientStorage;
use crate::types::ClientCredential;

/// Resolves and registers OAuth clients.
pub struct ClientDirectory {
    storage: Arc<dyn ClientStorage>,
    cache: DashMap<String, ClientCredential>,
}

impl ClientDirectory {
    /// Creates an empty directory over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self {
            storage,
            cache: DashMap::new(),
        }
    }

    /// Looks a client up by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the client is unknown, or the storage
    /// error unchanged.
    pub async fn resolve(&self, client_id: &str) -> AuthResult<ClientCredential> {
        if let Some(entry) = self.cache.get(client_id) {
            return Ok(entry.value().clone());
        }

        debug!(client_id, "Client cache miss");
        self.storage
            .find_by_client_id(client_id)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("client {client_id}")))
    }

    /// Persists a new client, then caches it.
    ///
    /// # Errors
    ///
    /// Returns the storage error; the cache is only updated on success.
    pub async fn register(&self, client: ClientCredential) -> AuthResult<()> {
        self.storage.create(&client).await?;

        info!(client_id = %client.id, domain = %client.domain, "Client registered");
        self.cache.insert(client.id.clone(), client);
        Ok(())
    }

    /// Number of cached clients.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
