//! Client storage trait.
//!
//! Durable backing for the [`ClientDirectory`](crate::directory::ClientDirectory).

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::ClientCredential;

/// Storage trait for OAuth client credentials.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Finds a client by its ID.
    ///
    /// # Returns
    ///
    /// Returns `Some(client)` if found, `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<ClientCredential>>;

    /// Persists a new client.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the client ID is taken, or an error if
    /// the storage operation fails.
    async fn create(&self, client: &ClientCredential) -> AuthResult<()>;
}
