//! Redis cache manager
//!
//! This module provides the Redis-backed implementation of [`CacheStore`]
//! and its connection management.

use crate::errors::CacheError;
use crate::store::CacheStore;
use async_trait::async_trait;
use config::CacheConfig;
use redis::{AsyncCommands, Client};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Redis-based cache manager
#[derive(Clone)]
pub struct CacheManager {
    client: Arc<Client>,
    config: Arc<CacheConfig>,
    connection_pool: Arc<RwLock<Option<redis::aio::MultiplexedConnection>>>,
}

impl Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection_status = match self.connection_pool.try_read() {
            Ok(pool) if pool.is_some() => "connected",
            Ok(_) => "no_connection",
            Err(_) => "lock_error",
        };

        f.debug_struct("CacheManager")
            .field("key_prefix", &self.config.key_prefix)
            .field("default_ttl", &self.config.default_ttl)
            .field("connected", &connection_status)
            .finish()
    }
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;

        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
            connection_pool: Arc::new(RwLock::new(None)),
        })
    }

    /// Get or create Redis connection
    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        let mut pool = self.connection_pool.write().await;

        if pool.is_none() {
            let connection = self.client.get_multiplexed_async_connection().await?;
            *pool = Some(connection);
        }

        Ok(pool
            .as_ref()
            .ok_or_else(|| CacheError::Connection("Failed to get connection from pool".into()))?
            .clone())
    }

    /// Full Redis key for a grouped cache key
    pub fn build_key(&self, group: &str, key: &str) -> String {
        format!("{}:{}:{}", self.config.key_prefix, group, key)
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<String, CacheError> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }

    /// Get current configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

#[async_trait]
impl CacheStore for CacheManager {
    async fn get(&self, group: &str, key: &str) -> Result<Option<Value>, CacheError> {
        let cache_key = self.build_key(group, key);
        let mut conn = self.get_connection().await?;

        let cached_data: Option<String> = conn.get(&cache_key).await?;
        debug_log!("Redis GET {} hit={}", cache_key, cached_data.is_some());

        match cached_data {
            Some(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, group: &str, key: &str, value: &Value) -> Result<(), CacheError> {
        let cache_key = self.build_key(group, key);
        let json_str = serde_json::to_string(value)?;
        let mut conn = self.get_connection().await?;

        let _: () = conn
            .set_ex(&cache_key, &json_str, self.config.default_ttl)
            .await?;
        Ok(())
    }

    async fn clear_key(&self, group: &str, key: &str) -> Result<(), CacheError> {
        let cache_key = self.build_key(group, key);
        let mut conn = self.get_connection().await?;

        let deleted: i32 = conn.del(&cache_key).await?;
        debug_log!("Redis DEL {} removed={}", cache_key, deleted);
        let _ = deleted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let manager =
            CacheManager::new(CacheConfig::new("redis://localhost:6379".into(), 60, "app".into()))
                .unwrap();
        assert_eq!(
            manager.build_key("MODELDATA_DEFAULT_USER", "PRIMARY_7"),
            "app:MODELDATA_DEFAULT_USER:PRIMARY_7"
        );
    }
}
