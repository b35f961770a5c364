//! Cache system for model data
//!
//! This crate provides the grouped key/value cache capability used by models,
//! with a Redis-backed store and an in-process store.

/// Conditional debug logging macros
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub mod errors;
pub mod manager;
pub mod memory;
pub mod prelude;
pub mod store;

// Re-export centralized config
pub use config::CacheConfig;

pub use errors::CacheError;
pub use manager::CacheManager;
pub use memory::MemoryCache;
pub use store::CacheStore;
