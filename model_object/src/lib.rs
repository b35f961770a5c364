//! Model Object - schema-driven models for Modelhaus
//!
//! This crate turns JSON schema descriptors into models that build and run
//! parameterized statements, validate and normalize field data, track
//! changes on single-row entries and cache results per model type.

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

pub mod backend;
pub mod comparator;
pub mod context;
pub mod entry;
pub mod entry_stack;
pub mod errors;
pub mod field_definition;
pub mod model;
pub mod prelude;
pub mod query_builder;
pub mod schema;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use backend::{PgBackend, Row, StorageBackend};
pub use comparator::Comparator;
pub use context::{ErrorHandler, ModelContext, ModelContextBuilder, SharedEntry, TracingErrorHandler};
pub use entry::{Entry, FieldChange};
pub use entry_stack::EntryStack;
pub use errors::{InvalidField, ModelhausError};
pub use field_definition::FieldDefinition;
pub use model::{FlagSource, Model, ModelDefinition};
pub use query_builder::{Query, Slang, SortOrder};
pub use schema::{FieldSchema, JsonFileSchemaSource, SchemaDescriptor, SchemaSource, StaticSchemaSource};
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
