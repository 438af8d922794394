use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by a [`KvStore`] adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Flat string-keyed persistence the engine runs on.
///
/// Values are opaque strings to the store; the engine's repository layer owns
/// the encoding. Implementations must be safe to share behind an `Arc`.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value for `key`, or `None` when the key was never set.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Sets `key` to `value`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Lists every stored key, in no particular order.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: tokio::sync::RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("trips").await.unwrap(), None);

        store.set("trips", "[]").await.unwrap();
        assert_eq!(store.get("trips").await.unwrap(), Some("[]".to_string()));

        store.set("trips", "[1]").await.unwrap();
        assert_eq!(store.get("trips").await.unwrap(), Some("[1]".to_string()));

        store.remove("trips").await.unwrap();
        assert_eq!(store.get("trips").await.unwrap(), None);
        // Removing again stays quiet.
        store.remove("trips").await.unwrap();
    }

    #[tokio::test]
    async fn keys_lists_all_entries() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, ["a", "b"]);
    }
}
