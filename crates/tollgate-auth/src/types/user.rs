//! User credential type.

use std::fmt;

use time::OffsetDateTime;

/// A user that can authenticate with a password.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredential {
    /// Unique identifier, used as the token subject.
    pub id: String,

    /// Unique login name.
    pub username: String,

    /// Argon2 PHC hash of the password.
    pub password_hash: String,

    /// When the user was registered.
    pub created_at: OffsetDateTime,
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
