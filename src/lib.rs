//! # ModelHaus
//!
//! A schema-driven model layer for PostgreSQL. Models are described by JSON
//! schema files; queries are composed with filters, orders, limits and joins
//! and compiled into SQL by the slang. Results are cached per model, single
//! rows are cached by primary key, and every write emits a signal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelhaus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let modelhaus = ModelHaus::new(config).await?;
//!
//!     let mut user = modelhaus.model("user").await?;
//!     user.add_filter("user_status", "active").add_order("user_name", SortOrder::Asc);
//!     let rows = user.search().await;
//!     println!("Found {} users", rows.len());
//!
//!     if let Some(entry) = user.load_entry(json!(1)).await? {
//!         let mut entry = entry.lock().await;
//!         entry.set_field("user_name", "Jane")?;
//!         entry.save(&mut user).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::ModelHaus;
pub use errors::ModelHausError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, DatabaseConfig, ModelConfig};

// Re-export internal crates used by the public API
pub use model_object;
pub use cache_system;
pub use signal_system;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use sqlx;
pub use async_trait;
