//! Convenience re-exports for common ModelHaus usage
//!
//! This prelude module re-exports the most commonly used items from the ModelHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use modelhaus::prelude::*;
//!
//! // Now you have access to all the common ModelHaus types and traits
//! ```

// Core ModelHaus components
pub use crate::core::ModelHaus;
pub use crate::errors::ModelHausError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, DatabaseConfig, ModelConfig};

// Re-export commonly used model-object types for convenience
pub use model_object::prelude::*;

// Re-export signal system for event handling
pub use signal_system::prelude::*;

// Re-export cache system
pub use cache_system::{CacheError, CacheManager, CacheStore, MemoryCache};

// Re-export type mapping
pub use type_mapping::{DataType, FieldValidator, ValidatorOptions, ValidatorSet};

// Common external dependencies
pub use sqlx;
pub use tokio;
