use async_trait::async_trait;
use dashmap::DashMap;

use super::{KeyValueStore, StoreError};

/// In-memory store backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(key, value)` pairs
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (key, value) in entries {
            store.entries.insert(key.into(), value.into());
        }
        store
    }

    /// Synchronous peek, mostly for assertions
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("auth_token").await.unwrap(), None);

        store.set("auth_token", "abc").await.unwrap();
        assert_eq!(
            store.get("auth_token").await.unwrap().as_deref(),
            Some("abc")
        );

        store.remove("auth_token").await.unwrap();
        assert!(!store.contains_key("auth_token"));

        // Removing twice is fine
        store.remove("auth_token").await.unwrap();
    }

    #[tokio::test]
    async fn test_with_entries() {
        let store = MemoryStore::with_entries([("a", "1"), ("b", "2")]);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }
}
