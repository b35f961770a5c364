//! In-process cache store
//!
//! Used when Redis is disabled and throughout the test suites.

use crate::errors::CacheError;
use crate::store::CacheStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all groups
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a key is present without cloning its value
    pub fn contains(&self, group: &str, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(&(group.to_string(), key.to_string())))
            .unwrap_or(false)
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> CacheError {
    CacheError::Poisoned(err.to_string())
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, group: &str, key: &str) -> Result<Option<Value>, CacheError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(&(group.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, group: &str, key: &str, value: &Value) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert((group.to_string(), key.to_string()), value.clone());
        Ok(())
    }

    async fn clear_key(&self, group: &str, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(&(group.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_groups_are_isolated() {
        let cache = MemoryCache::new();
        cache.set("USERS", "PRIMARY_1", &json!({"id": 1})).await.unwrap();

        assert_eq!(
            cache.get("USERS", "PRIMARY_1").await.unwrap(),
            Some(json!({"id": 1}))
        );
        assert_eq!(cache.get("ORDERS", "PRIMARY_1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_key() {
        let cache = MemoryCache::new();
        cache.set("USERS", "PRIMARY_1", &json!([1])).await.unwrap();
        cache.set("USERS", "PRIMARY_2", &json!([2])).await.unwrap();

        cache.clear_key("USERS", "PRIMARY_1").await.unwrap();
        // clearing twice is fine
        cache.clear_key("USERS", "PRIMARY_1").await.unwrap();

        assert!(!cache.contains("USERS", "PRIMARY_1"));
        assert!(cache.contains("USERS", "PRIMARY_2"));
        assert_eq!(cache.len(), 1);
    }
}
