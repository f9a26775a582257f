//! Process-local storage backends.
//!
//! Each store keeps its maps behind a single `tokio::sync::RwLock`, so every
//! operation runs inside one critical section and is atomic with respect to
//! concurrent callers and to cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::clock::Clock;
use crate::error::AuthError;
use crate::storage::{ClientStorage, TokenStore, UserStorage};
use crate::types::{ClientCredential, TokenRecord, TokenStats, UserCredential};

// =============================================================================
// Token Store
// =============================================================================

#[derive(Default)]
struct TokenTable {
    by_access: HashMap<String, TokenRecord>,
    /// refresh handle -> access handle
    by_refresh: HashMap<String, String>,
}

impl TokenTable {
    fn remove_access(&mut self, access_handle: &str) -> u64 {
        match self.by_access.remove(access_handle) {
            Some(record) => {
                if let Some(refresh) = record.refresh_handle {
                    self.by_refresh.remove(&refresh);
                }
                1
            }
            None => 0,
        }
    }
}

/// In-memory token record store.
///
/// Expiry is judged against the injected [`Clock`], so tests can move time
/// forward without sleeping.
pub struct InMemoryTokenStore {
    table: RwLock<TokenTable>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: RwLock::new(TokenTable::default()),
            clock,
        }
    }

    /// Number of rows physically held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.table.read().await.by_access.len()
    }

    /// Returns `true` if no rows are held.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn create(&self, record: &TokenRecord) -> AuthResult<()> {
        record.validate()?;

        let mut stored = record.clone();
        stored.updated_at = self.clock.now();

        let mut table = self.table.write().await;

        if let Some(refresh) = &stored.refresh_handle
            && let Some(owner) = table.by_refresh.get(refresh)
            && owner != &stored.access_handle
        {
            return Err(AuthError::conflict(
                "refresh handle already belongs to another token",
            ));
        }

        let replaced_refresh = table
            .by_access
            .get(&stored.access_handle)
            .and_then(|previous| previous.refresh_handle.clone());
        if let Some(old_refresh) = replaced_refresh {
            table.by_refresh.remove(&old_refresh);
        }

        if let Some(refresh) = &stored.refresh_handle {
            table
                .by_refresh
                .insert(refresh.clone(), stored.access_handle.clone());
        }
        table.by_access.insert(stored.access_handle.clone(), stored);

        Ok(())
    }

    async fn get_by_access(&self, access_handle: &str) -> AuthResult<Option<TokenRecord>> {
        let now = self.clock.now();
        let table = self.table.read().await;
        Ok(table
            .by_access
            .get(access_handle)
            .filter(|r| r.is_access_live(now))
            .cloned())
    }

    async fn get_by_refresh(&self, refresh_handle: &str) -> AuthResult<Option<TokenRecord>> {
        let now = self.clock.now();
        let table = self.table.read().await;
        Ok(table
            .by_refresh
            .get(refresh_handle)
            .and_then(|access| table.by_access.get(access))
            .filter(|r| r.is_refresh_live(now))
            .cloned())
    }

    async fn remove_by_access(&self, access_handle: &str) -> AuthResult<u64> {
        Ok(self.table.write().await.remove_access(access_handle))
    }

    async fn remove_by_refresh(&self, refresh_handle: &str) -> AuthResult<u64> {
        let mut table = self.table.write().await;
        match table.by_refresh.get(refresh_handle).cloned() {
            Some(access) => Ok(table.remove_access(&access)),
            None => Ok(0),
        }
    }

    async fn clean_expired_tokens(&self) -> AuthResult<u64> {
        let now = self.clock.now();
        let mut table = self.table.write().await;

        let doomed: Vec<String> = table
            .by_access
            .values()
            .filter(|r| r.is_sweepable(now))
            .map(|r| r.access_handle.clone())
            .collect();

        Ok(doomed
            .iter()
            .map(|access| table.remove_access(access))
            .sum())
    }

    async fn get_stats(&self) -> AuthResult<TokenStats> {
        let now = self.clock.now();
        let table = self.table.read().await;

        let total = table.by_access.len() as u64;
        let active = table
            .by_access
            .values()
            .filter(|r| r.is_access_live(now))
            .count() as u64;
        let with_refresh = table.by_refresh.len() as u64;

        Ok(TokenStats::new(total, active, with_refresh))
    }
}

// =============================================================================
// Client Storage
// =============================================================================

/// In-memory client storage.
#[derive(Default)]
pub struct InMemoryClientStorage {
    clients: RwLock<HashMap<String, ClientCredential>>,
}

impl InMemoryClientStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStorage for InMemoryClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<ClientCredential>> {
        Ok(self.clients.read().await.get(client_id).cloned())
    }

    async fn create(&self, client: &ClientCredential) -> AuthResult<()> {
        let mut clients = self.clients.write().await;
        if clients.contains_key(&client.id) {
            return Err(AuthError::conflict(format!(
                "client '{}' already exists",
                client.id
            )));
        }
        clients.insert(client.id.clone(), client.clone());
        Ok(())
    }
}

// =============================================================================
// User Storage
// =============================================================================

/// In-memory user storage keyed by username.
#[derive(Default)]
pub struct InMemoryUserStorage {
    users: RwLock<HashMap<String, UserCredential>>,
}

impl InMemoryUserStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserCredential>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn create(&self, user: &UserCredential) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) || users.values().any(|u| u.id == user.id) {
            return Err(AuthError::conflict(format!(
                "user '{}' already exists",
                user.username
            )));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }
}
