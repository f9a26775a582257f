//! Credential verification.
//!
//! [`CredentialVerifier`] checks user passwords and client secrets. Failure
//! messages are generic on purpose: a caller cannot tell whether the
//! identifier or the secret was wrong. Storage errors pass through unchanged.

pub mod password;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AuthResult;
use crate::clock::Clock;
use crate::directory::ClientDirectory;
use crate::error::AuthError;
use crate::storage::UserStorage;
use crate::types::{ClientCredential, UserCredential};

pub use password::{hash_password, verify_password};

/// Password-grant hook wired into the protocol engine.
///
/// Returns the user ID the engine should issue tokens for.
#[async_trait]
pub trait PasswordAuthorizationHandler: Send + Sync {
    /// Authenticates `username` on behalf of `client_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on any mismatch.
    async fn authorize(&self, client_id: &str, username: &str, password: &str)
    -> AuthResult<String>;
}

/// Verifies users and clients against their stores.
pub struct CredentialVerifier {
    users: Arc<dyn UserStorage>,
    clients: Arc<ClientDirectory>,
    clock: Arc<dyn Clock>,
}

impl CredentialVerifier {
    /// Creates a verifier.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStorage>,
        clients: Arc<ClientDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            clients,
            clock,
        }
    }

    /// Returns the client directory this verifier resolves through.
    #[must_use]
    pub fn clients(&self) -> &Arc<ClientDirectory> {
        &self.clients
    }

    /// Checks a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown, the
    /// password does not match, or the stored hash is unusable.
    pub async fn verify_user(&self, username: &str, password: &str) -> AuthResult<UserCredential> {
        let Some(user) = self.users.find_by_username(username).await? else {
            debug!("Password check for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        match verify_password(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => {
                debug!(user_id = %user.id, "Password mismatch");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unparsable");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Checks a client ID and secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClient` if the client is unknown or the
    /// secret does not match.
    pub async fn verify_client(&self, client_id: &str, secret: &str) -> AuthResult<ClientCredential> {
        let client = match self.clients.resolve(client_id).await {
            Ok(client) => client,
            Err(AuthError::NotFound { .. }) => {
                return Err(AuthError::invalid_client("invalid client credentials"));
            }
            Err(e) => return Err(e),
        };

        if !client.secret_matches(secret) {
            debug!(client_id, "Client secret mismatch");
            return Err(AuthError::invalid_client("invalid client credentials"));
        }
        Ok(client)
    }

    /// Registers a new password user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRequest` for an empty username or password,
    /// `AuthError::Conflict` if the username is taken, or the storage error.
    pub async fn register_user(&self, username: &str, password: &str) -> AuthResult<UserCredential> {
        if username.is_empty() {
            return Err(AuthError::invalid_request("username must not be empty"));
        }
        if password.is_empty() {
            return Err(AuthError::invalid_request("password must not be empty"));
        }

        let password_hash = hash_password(password)
            .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))?;

        let user = UserCredential {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            created_at: self.clock.now(),
        };
        self.users.create(&user).await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }
}

#[async_trait]
impl PasswordAuthorizationHandler for CredentialVerifier {
    async fn authorize(
        &self,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> AuthResult<String> {
        let user = self.verify_user(username, password).await?;
        debug!(client_id, user_id = %user.id, "Password grant authorized");
        Ok(user.id)
    }
}
