//! Client credential storage.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;

use tollgate_auth::types::ClientCredential;

use crate::{PgPool, StorageError, StorageResult};

type ClientTuple = (String, String, String, String, OffsetDateTime);

fn client_from_tuple(row: ClientTuple) -> ClientCredential {
    ClientCredential::new(row.0, row.1, row.2, row.3, row.4)
}

/// Client storage operations.
pub struct ClientStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientStorage<'a> {
    /// Create a new client storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a client by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, client_id: &str) -> StorageResult<Option<ClientCredential>> {
        let row: Option<ClientTuple> = query_as(
            r#"
            SELECT id, secret, domain, user_id, created_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(client_from_tuple))
    }

    /// Insert a new client.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the ID is taken, or a database error.
    pub async fn create(&self, client: &ClientCredential) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO clients (id, secret, domain, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&client.id)
        .bind(&client.secret)
        .bind(&client.domain)
        .bind(&client.user_id)
        .bind(client.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict(format!(
                    "client '{}' already exists",
                    client.id
                ));
            }
            StorageError::from(e)
        })?;

        Ok(())
    }
}
