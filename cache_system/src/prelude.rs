//! Convenience re-exports for common cache-system usage

pub use crate::errors::CacheError;
pub use crate::manager::CacheManager;
pub use crate::memory::MemoryCache;
pub use crate::store::CacheStore;

// Re-export centralized config
pub use config::CacheConfig;

pub use async_trait::async_trait;
pub use serde_json;
