//! User credential storage.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;

use tollgate_auth::types::UserCredential;

use crate::{PgPool, StorageError, StorageResult};

type UserTuple = (String, String, String, OffsetDateTime);

fn user_from_tuple(row: UserTuple) -> UserCredential {
    UserCredential {
        id: row.0,
        username: row.1,
        password_hash: row.2,
        created_at: row.3,
    }
}

/// User storage operations.
pub struct UserStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStorage<'a> {
    /// Create a new user storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> StorageResult<Option<UserCredential>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(user_from_tuple))
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the ID or username is taken, or a
    /// database error.
    pub async fn create(&self, user: &UserCredential) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::conflict(format!(
                    "user '{}' already exists",
                    user.username
                ));
            }
            StorageError::from(e)
        })?;

        Ok(())
    }
}
