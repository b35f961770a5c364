//! Single-row entries with change tracking
//!
//! An entry wraps the data of one row. Field writes are validated one by
//! one and, once the entry is built, every accepted write is recorded so
//! that saving an unchanged entry is a no-op.

use crate::backend::Row;
use crate::errors::{InvalidField, ModelhausError, Result};
use crate::field_definition::FieldDefinition;
use crate::model::{Model, ModelDefinition};
use serde_json::Value;
use signal_system::{EventType, ModelEvent, SignalManager};
use std::collections::BTreeMap;
use std::sync::Arc;
use type_mapping::{is_empty_value, loosely_equal, value_to_text, ValidatorSet};

/// Previous and new value of a changed field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

#[derive(Debug, Clone)]
pub struct Entry {
    definition: Arc<ModelDefinition>,
    validators: Arc<ValidatorSet>,
    signals: Option<Arc<SignalManager>>,
    data: Row,
    /// `None` while the entry is being built
    changed_fields: Option<BTreeMap<String, FieldChange>>,
}

impl Entry {
    fn unarmed(
        definition: Arc<ModelDefinition>,
        validators: Arc<ValidatorSet>,
        signals: Option<Arc<SignalManager>>,
    ) -> Self {
        Self {
            definition,
            validators,
            signals,
            data: Row::new(),
            changed_fields: None,
        }
    }

    /// Build from `data`, skipping fields that fail validation
    pub(crate) fn lenient(
        definition: Arc<ModelDefinition>,
        validators: Arc<ValidatorSet>,
        signals: Option<Arc<SignalManager>>,
        data: Row,
    ) -> Self {
        let mut entry = Self::unarmed(definition, validators, signals);
        for invalid in entry.apply_all(&data) {
            tracing::warn!(
                "Discarding invalid value of {}.{}: {}",
                entry.definition.name(),
                invalid.field,
                invalid.errors.join("; ")
            );
        }
        entry.changed_fields = Some(BTreeMap::new());
        entry
    }

    /// Build from `data`, failing when any field is invalid
    pub(crate) fn strict(
        definition: Arc<ModelDefinition>,
        validators: Arc<ValidatorSet>,
        signals: Option<Arc<SignalManager>>,
        data: Row,
    ) -> Result<Self> {
        let mut entry = Self::unarmed(definition, validators, signals);
        let invalid = entry.apply_all(&data);
        if !invalid.is_empty() {
            return Err(ModelhausError::InvalidData(invalid));
        }
        entry.changed_fields = Some(BTreeMap::new());
        Ok(entry)
    }

    pub fn model_name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &Arc<ModelDefinition> {
        &self.definition
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn data(&self) -> &Row {
        &self.data
    }

    /// Non-empty primary-key value, if the entry has one
    pub fn primary_key_value(&self) -> Option<&Value> {
        self.data
            .get(self.definition.primary_key())
            .filter(|v| !is_empty_value(v))
    }

    pub fn changed_fields(&self) -> Option<&BTreeMap<String, FieldChange>> {
        self.changed_fields.as_ref()
    }

    pub fn has_changes(&self) -> bool {
        self.changed_fields.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Write several fields; every invalid field is reported together
    pub fn set(&mut self, fields: Row) -> Result<()> {
        let invalid = self.apply_all(&fields);
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(ModelhausError::InvalidData(invalid))
        }
    }

    /// Write one field.
    ///
    /// Unknown fields are ignored, empty values are stored as null and a
    /// value loosely equal to the current one changes nothing.
    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        let Some(field) = definition.field(field) else {
            return Ok(());
        };
        self.apply_field(field, value.into())?;
        Ok(())
    }

    /// Save through `model` when anything changed; returns whether a save
    /// happened
    pub async fn save(&mut self, model: &mut Model) -> Result<bool> {
        if !self.has_changes() {
            return Ok(false);
        }

        model.save_entry(self).await?;
        self.changed_fields = Some(BTreeMap::new());
        Ok(true)
    }

    fn apply_all(&mut self, data: &Row) -> Vec<InvalidField> {
        let definition = Arc::clone(&self.definition);
        definition
            .fields()
            .iter()
            .filter_map(|field| {
                let value = data.get(&field.name)?.clone();
                self.apply_field(field, value).err()
            })
            .collect()
    }

    fn apply_field(&mut self, field: &FieldDefinition, value: Value) -> std::result::Result<(), InvalidField> {
        let value = if is_empty_value(&value) { Value::Null } else { value };

        let current = self.data.get(&field.name).cloned();
        let unchanged = match &current {
            Some(current) => loosely_equal(current, &value),
            None => self.changed_fields.is_some() && value.is_null(),
        };
        if unchanged {
            return Ok(());
        }

        if let Some(changes) = self.changed_fields.as_mut() {
            changes
                .entry(field.name.clone())
                .and_modify(|change| change.new = value.clone())
                .or_insert_with(|| FieldChange {
                    old: current.unwrap_or_else(|| Value::String("null".to_string())),
                    new: value.clone(),
                });
        }

        self.emit(EventType::FieldSetStart, &field.name, &value);

        let errors = self.validators.validate(
            field.data_type,
            &value,
            &field.validator_options(!field.required),
        );
        if !errors.is_empty() {
            self.emit(EventType::FieldSetInvalid, &field.name, &value);
            return Err(InvalidField::new(&field.name, value, errors));
        }

        self.data.insert(field.name.clone(), value.clone());
        self.emit(EventType::FieldSetSuccess, &field.name, &value);
        Ok(())
    }

    fn emit(&self, event_type: EventType, field: &str, value: &Value) {
        let Some(signals) = &self.signals else {
            return;
        };

        let mut event = ModelEvent::new(event_type, self.definition.name())
            .with_field(field)
            .with_payload("value", value.clone());
        if let Some(id) = self.primary_key_value() {
            event = event.with_record_id(value_to_text(id));
        }
        signals.emit(event);
    }
}
