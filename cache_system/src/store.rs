//! Cache store capability
//!
//! Models address the cache through named groups (one per model type and
//! connection) and plain string keys inside each group.

use crate::errors::CacheError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Fetch a value, `None` on miss
    async fn get(&self, group: &str, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store a value, replacing any previous one
    async fn set(&self, group: &str, key: &str, value: &Value) -> Result<(), CacheError>;

    /// Remove a single key; removing a missing key is not an error
    async fn clear_key(&self, group: &str, key: &str) -> Result<(), CacheError>;
}
