//! Convenience re-exports for common model usage

// Models and entries
pub use crate::entry::{Entry, FieldChange};
pub use crate::entry_stack::EntryStack;
pub use crate::model::{FlagSource, Model, ModelDefinition};

// Context and capabilities
pub use crate::backend::{PgBackend, Row, StorageBackend};
pub use crate::context::{ErrorHandler, ModelContext, SharedEntry, TracingErrorHandler};
pub use crate::schema::{JsonFileSchemaSource, SchemaDescriptor, SchemaSource, StaticSchemaSource};

// Query building
pub use crate::comparator::Comparator;
pub use crate::query_builder::SortOrder;

// Error types
pub use crate::errors::{InvalidField, ModelhausError};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde_json::{json, Value};
