//! Typed filter predicates
//!
//! This module builds the per-field predicates a model accumulates before a
//! query is compiled.

use crate::comparator::Comparator;
use crate::errors::{ModelhausError, Result};
use serde_json::Value;
use std::sync::OnceLock;
use type_mapping::{value_to_text, DataType};

/// Filter variant, chosen by the field's data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Number,
    Date,
    Text,
}

const NUMBER_COMPARATORS: &[Comparator] = &[
    Comparator::Equals,
    Comparator::NotEquals,
    Comparator::Less,
    Comparator::LessOrEqual,
    Comparator::Greater,
    Comparator::GreaterOrEqual,
];

const DATE_COMPARATORS: &[Comparator] = NUMBER_COMPARATORS;

const TEXT_COMPARATORS: &[Comparator] = &[
    Comparator::Contains,
    Comparator::NotContains,
    Comparator::Begins,
    Comparator::NotBegins,
    Comparator::Ends,
    Comparator::NotEnds,
    Comparator::Equals,
    Comparator::NotEquals,
];

impl FilterKind {
    /// `number*` types filter as numbers, `date`/`text_date` as dates,
    /// everything else as text
    pub fn for_type(data_type: DataType) -> Self {
        match data_type {
            DataType::Number
            | DataType::NumberNatural
            | DataType::NumberInteger
            | DataType::NumberPort => FilterKind::Number,
            DataType::Date | DataType::TextDate => FilterKind::Date,
            DataType::Text
            | DataType::TextDomain
            | DataType::TextTimestamp
            | DataType::Structure
            | DataType::Boolean
            | DataType::File => FilterKind::Text,
        }
    }

    /// Comparators that make sense for this variant
    pub fn comparators(&self) -> &'static [Comparator] {
        match self {
            FilterKind::Number => NUMBER_COMPARATORS,
            FilterKind::Date => DATE_COMPARATORS,
            FilterKind::Text => TEXT_COMPARATORS,
        }
    }
}

/// Predicate bound to one field
#[derive(Debug, Clone)]
pub struct Filter {
    field_name: String,
    data_type: DataType,
    kind: FilterKind,
    operator: Comparator,
    value: Value,
    mask: OnceLock<Option<&'static str>>,
}

impl Filter {
    /// Build the variant matching `data_type`; never rejects a comparator
    pub fn create(field_name: &str, data_type: DataType, operator: Comparator, value: Value) -> Self {
        Self {
            field_name: field_name.to_string(),
            data_type,
            kind: FilterKind::for_type(data_type),
            operator,
            value,
            mask: OnceLock::new(),
        }
    }

    /// Like [`Filter::create`], but refuses comparators outside the variant's set
    pub fn try_create(
        field_name: &str,
        data_type: DataType,
        operator: Comparator,
        value: Value,
    ) -> Result<Self> {
        let filter = Self::create(field_name, data_type, operator, value);
        if !filter.allows_operator() {
            return Err(ModelhausError::QueryCompilation(format!(
                "comparator '{}' is not allowed on {} field '{}'",
                operator, data_type, field_name
            )));
        }
        Ok(filter)
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn operator(&self) -> Comparator {
        self.operator
    }

    pub fn raw_value(&self) -> &Value {
        &self.value
    }

    pub fn allows_operator(&self) -> bool {
        self.kind.comparators().contains(&self.operator)
    }

    /// Mask template, computed on first use
    pub fn mask(&self) -> Option<&'static str> {
        *self.mask.get_or_init(|| self.operator.mask_template())
    }

    pub fn operator_token(&self) -> &'static str {
        self.operator.operator_token()
    }

    /// Raw value, or the value interpolated into the mask for LIKE operators
    pub fn rendered_value(&self) -> Value {
        match self.mask() {
            None => self.value.clone(),
            Some(mask) => match &self.value {
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .map(|item| Value::String(mask.replace("{value}", &value_to_text(item))))
                        .collect(),
                ),
                value => Value::String(mask.replace("{value}", &value_to_text(value))),
            },
        }
    }

    /// Empty values and the literal `null` compile to `IS NULL`
    pub fn matches_null(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty() || s.eq_ignore_ascii_case("null"),
            _ => false,
        }
    }
}
