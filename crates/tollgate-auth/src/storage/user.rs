//! User storage trait.
//!
//! Defines the interface for user persistence operations.
//! Implementations are provided by storage backends (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::UserCredential;

/// Storage trait for password-authenticated users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserCredential>>;

    /// Persists a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the username or ID is taken, or an
    /// error if the storage operation fails.
    async fn create(&self, user: &UserCredential) -> AuthResult<()>;
}
