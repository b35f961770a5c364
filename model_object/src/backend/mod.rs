//! Storage backend capability
//!
//! A backend executes compiled statements for one named connection. Reads
//! return rows as JSON objects keyed by column name; writes return the
//! number of affected rows.

pub mod postgres;

use crate::errors::Result;
use crate::query_builder::{Parameters, Query};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

pub use postgres::PgBackend;

/// One result row, column name to value
pub type Row = serde_json::Map<String, Value>;

#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Run a row-returning statement
    async fn read(&self, text: &str, parameters: &Parameters) -> Result<Vec<Row>>;

    /// Run a mutating statement
    async fn write(&self, query: &Query) -> Result<u64>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
