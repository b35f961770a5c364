use crate::model::ModelDefinition;
use crate::query_builder::filter::Filter;
use crate::query_builder::ordering::Order;
use crate::query_builder::pagination::{Field, Limit, Offset};
use std::sync::Arc;

/// Clauses accumulated by one model between executions
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub filters: Vec<Filter>,
    pub orders: Vec<Order>,
    pub fields: Vec<Field>,
    pub joined: Vec<QueryNode>,
    pub limit: Option<Limit>,
    pub offset: Option<Offset>,
}

impl QueryState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.orders.is_empty()
            && self.fields.is_empty()
            && self.joined.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
    }
}

/// A model's definition together with its pending clauses; joined models
/// hang off `state.joined`
#[derive(Debug, Clone)]
pub struct QueryNode {
    pub definition: Arc<ModelDefinition>,
    pub state: QueryState,
}

impl QueryNode {
    pub fn new(definition: Arc<ModelDefinition>) -> Self {
        Self {
            definition,
            state: QueryState::default(),
        }
    }
}
