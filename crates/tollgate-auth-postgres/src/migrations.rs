//! Database migration management for the PostgreSQL auth backend.
//!
//! This module uses embedded migrations for single-binary deployment.

use std::borrow::Cow;

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use tracing::{info, instrument};

use crate::{PgPool, StorageError, StorageResult};

/// Embedded migrations in chronological order.
///
/// Each entry is (version, description, sql).
macro_rules! embedded_migrations {
    () => {
        &[(
            20260301000001i64,
            "token_lifecycle",
            include_str!("../migrations/20260301000001_token_lifecycle.sql"),
        )]
    };
}

/// Builds a vector of Migration structs from embedded migration data.
fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]), // Empty checksum for embedded migrations
            no_tx: false,
        })
        .collect()
}

/// Applies all pending migrations.
///
/// Applied versions are tracked in `_sqlx_migrations`; the migrator holds an
/// advisory lock so concurrent starters apply each migration once.
///
/// To add a new migration:
/// 1. Create the SQL file in the migrations/ directory
/// 2. Add an entry to the embedded_migrations!() macro above
///
/// # Errors
///
/// Returns `StorageError::Migration` if a migration fails to execute.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> StorageResult<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running auth database migrations");

    let migrator = Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| StorageError::Migration(format!("Migration failed: {e}")))?;

    info!("Auth database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let migrations = build_migrations();
        assert!(!migrations.is_empty());
        assert!(
            migrations
                .windows(2)
                .all(|pair| pair[0].version < pair[1].version)
        );
    }

    #[test]
    fn test_schema_declares_tables() {
        let sql = &build_migrations()[0].sql;
        for table in ["tokens", "clients", "users"] {
            assert!(sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")));
        }
        assert!(sql.contains("WHERE refresh_handle IS NOT NULL"));
    }
}
