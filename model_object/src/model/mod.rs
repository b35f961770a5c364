//! Schema-driven model
//!
//! A [`Model`] is bound to one model type. It accumulates filters, orders,
//! field selections, joined models and pagination, executes them as one
//! statement and resets its query state afterwards, so every search starts
//! from a clean slate:
//!
//! ```ignore
//! let mut users = context.model("user").await?;
//! users
//!     .add_filter("user_status", "active")
//!     .add_order("user_name", SortOrder::Asc)
//!     .set_limit(5);
//! let rows = users.search().await;
//! ```

mod data;
mod definition;
mod read;
mod write;

pub use data::FlagSource;
pub use definition::ModelDefinition;

use crate::backend::{Row, StorageBackend};
use crate::comparator::Comparator;
use crate::context::ModelContext;
use crate::entry::Entry;
use crate::errors::{ModelhausError, Result};
use crate::field_definition::FieldDefinition;
use crate::query_builder::{Field, Filter, Limit, Offset, Order, QueryNode, QueryState, SortOrder};
use serde_json::Value;
use signal_system::{EventType, ModelEvent};
use std::sync::Arc;
use type_mapping::{value_to_text, DataType};

#[derive(Debug)]
pub struct Model {
    context: Arc<ModelContext>,
    backend: Arc<dyn StorageBackend>,
    node: QueryNode,
    use_cache: bool,
}

impl Model {
    pub(crate) fn new(
        context: Arc<ModelContext>,
        definition: Arc<ModelDefinition>,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            context,
            backend,
            node: QueryNode::new(definition),
            use_cache: false,
        }
    }

    pub fn model_name(&self) -> &str {
        self.node.definition.name()
    }

    pub fn table(&self) -> &str {
        self.node.definition.table()
    }

    pub fn connection(&self) -> &str {
        self.node.definition.connection()
    }

    pub fn primary_key(&self) -> &str {
        self.node.definition.primary_key()
    }

    pub fn definition(&self) -> &Arc<ModelDefinition> {
        &self.node.definition
    }

    pub fn definitions(&self) -> &[FieldDefinition] {
        self.node.definition.fields()
    }

    pub fn field_definition(&self, field: &str) -> Option<&FieldDefinition> {
        self.node.definition.field(field)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.node.definition.field_names()
    }

    pub fn field_exists(&self, field: &str) -> bool {
        self.node.definition.field_exists(field)
    }

    pub fn field_type(&self, field: &str) -> Option<DataType> {
        self.node.definition.field_type(field)
    }

    pub fn context(&self) -> &Arc<ModelContext> {
        &self.context
    }

    /// Clauses pending for the next execution
    pub fn query_state(&self) -> &QueryState {
        &self.node.state
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.use_cache
    }

    // ========================================
    // Query building
    // ========================================

    /// Equality filter; unknown fields and empty lists are ignored
    pub fn add_filter(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.add_filter_op(field, value, Comparator::Equals)
    }

    pub fn add_filter_op(
        &mut self,
        field: &str,
        value: impl Into<Value>,
        comparator: Comparator,
    ) -> &mut Self {
        let value = value.into();
        let Some(data_type) = self.field_type(field) else {
            crate::debug_log!("Ignoring filter on unknown field {}.{}", self.model_name(), field);
            return self;
        };
        if matches!(&value, Value::Array(items) if items.is_empty()) {
            return self;
        }

        let filter = Filter::create(field, data_type, comparator, value);
        if !filter.allows_operator() {
            tracing::warn!(
                "Comparator '{}' is unusual for {} field {}.{}",
                comparator,
                data_type,
                self.model_name(),
                field
            );
        }
        self.node.state.filters.push(filter);
        self
    }

    /// Orders are not checked against the schema; the field name is quoted
    /// when compiled
    pub fn add_order(&mut self, field: &str, direction: SortOrder) -> &mut Self {
        self.node.state.orders.push(Order::new(field, direction));
        self
    }

    /// Clamped to `[0, max_limit]`
    pub fn set_limit(&mut self, limit: i64) -> &mut Self {
        let max = self.context.settings().max_limit;
        self.node.state.limit = Some(Limit::new(limit, max));
        self
    }

    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.node.state.offset = Some(Offset::new(offset));
        self
    }

    /// Restrict the selected columns; accepts comma-separated names and
    /// drops unknown ones
    pub fn add_field(&mut self, fields: &str) -> &mut Self {
        for name in fields.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if self.field_exists(name) {
                self.node.state.fields.push(Field::new(name));
            }
        }
        self
    }

    /// Serve the next search from, and store it in, the result cache
    pub fn use_cache(&mut self, enabled: bool) -> &mut Self {
        self.use_cache = enabled;
        self
    }

    /// Join another model; its filters and orders take part in the search
    pub fn add_model(&mut self, joined: Model) -> &mut Self {
        self.node.state.joined.push(joined.node);
        self
    }

    /// Drop all pending clauses and the cache switch
    pub fn reset(&mut self) {
        self.node.state.reset();
        self.use_cache = false;
    }

    // ========================================
    // Entries
    // ========================================

    /// Entry over `data`; invalid fields are skipped
    pub fn entry(&self, data: Row) -> Entry {
        Entry::lenient(
            Arc::clone(&self.node.definition),
            Arc::clone(self.context.validators()),
            self.context.signals().cloned(),
            data,
        )
    }

    /// Entry over `data`, failing on the first invalid set of fields
    pub fn entry_strict(&self, data: Row) -> Result<Entry> {
        Entry::strict(
            Arc::clone(&self.node.definition),
            Arc::clone(self.context.validators()),
            self.context.signals().cloned(),
            data,
        )
    }

    fn emit(&self, event_type: EventType, record_id: Option<&Value>, payload: Option<Value>) {
        let mut event = ModelEvent::new(event_type, self.model_name());
        if let Some(id) = record_id {
            event = event.with_record_id(value_to_text(id));
        }
        if let Some(payload) = payload {
            event = event.with_payload("data", payload);
        }
        self.context.emit(event);
    }

    fn report(&self, operation: &str, error: &ModelhausError) {
        self.context.report(self.model_name(), operation, error);
    }
}
