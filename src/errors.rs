//! Error types for the ModelHaus crate
//!
//! This module contains all error types that can be returned by ModelHaus operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelHausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] cache_system::CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Model(#[from] model_object::ModelhausError),
}
