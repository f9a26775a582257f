//! OAuth 2.0 client credential type.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A registered OAuth 2.0 client.
///
/// The secret is stored and compared as-is; it is never hashed by this crate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredential {
    /// Globally unique client identifier.
    pub id: String,

    /// Client secret, compared by exact match.
    pub secret: String,

    /// Redirect origin registered for the client.
    pub domain: String,

    /// Owning user.
    pub user_id: String,

    /// When the client was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ClientCredential {
    /// Creates a credential from known values.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        domain: impl Into<String>,
        user_id: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            domain: domain.into(),
            user_id: user_id.into(),
            created_at,
        }
    }

    /// Creates a fresh credential with a UUID id and a random secret.
    #[must_use]
    pub fn generate(
        domain: impl Into<String>,
        user_id: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self::new(
            Uuid::new_v4().to_string(),
            generate_client_secret(),
            domain,
            user_id,
            created_at,
        )
    }

    /// Returns `true` if `secret` matches exactly.
    #[must_use]
    pub fn secret_matches(&self, secret: &str) -> bool {
        self.secret == secret
    }
}

impl fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredential")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .field("domain", &self.domain)
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Generate a 256-bit random client secret encoded as hex (64 characters).
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_client() {
        let now = OffsetDateTime::now_utc();
        let client = ClientCredential::generate("https://app.example.com", "u1", now);

        assert!(Uuid::parse_str(&client.id).is_ok());
        assert_eq!(client.secret.len(), 64);
        assert!(hex::decode(&client.secret).is_ok());
        assert_eq!(client.domain, "https://app.example.com");
        assert_eq!(client.user_id, "u1");
    }

    #[test]
    fn test_generated_secrets_are_unique() {
        assert_ne!(generate_client_secret(), generate_client_secret());
    }

    #[test]
    fn test_secret_matches_exactly() {
        let client = ClientCredential::new("c1", "s3cret", "", "u1", OffsetDateTime::now_utc());
        assert!(client.secret_matches("s3cret"));
        assert!(!client.secret_matches("S3CRET"));
        assert!(!client.secret_matches("s3cret "));
        assert!(!client.secret_matches(""));
    }

    #[test]
    fn test_debug_hides_secret() {
        let client = ClientCredential::new("c1", "s3cret", "", "u1", OffsetDateTime::now_utc());
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("c1"));
        assert!(!rendered.contains("s3cret"));
    }
}
