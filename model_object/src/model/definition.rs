use crate::errors::{ModelhausError, Result};
use crate::field_definition::FieldDefinition;
use crate::schema::SchemaDescriptor;
use serde_json::Value;
use std::collections::HashMap;
use type_mapping::{value_to_text, DataType};

/// Resolved, validated schema of one model type.
///
/// Definitions are built once per model name and shared between every
/// model instance and entry of that type.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    name: String,
    primary_key: String,
    descriptor: SchemaDescriptor,
    fields: Vec<FieldDefinition>,
    index: HashMap<String, usize>,
}

impl ModelDefinition {
    pub fn new(name: &str, descriptor: SchemaDescriptor) -> Result<Self> {
        descriptor.validate(name)?;

        let primary_key = descriptor
            .primary_key()
            .ok_or_else(|| ModelhausError::configuration(name, "missing primary key"))?
            .to_string();

        let fields: Vec<FieldDefinition> = descriptor
            .fields
            .iter()
            .map(|(field, schema)| FieldDefinition::from_schema(field, schema, &descriptor))
            .collect();

        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        Ok(Self {
            name: name.to_string(),
            primary_key,
            descriptor,
            fields,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage table; always the model name
    pub fn table(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &str {
        &self.descriptor.connection
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Field definitions in declaration order
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|i| &self.fields[*i])
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field_exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn field_type(&self, name: &str) -> Option<DataType> {
        self.field(name).map(|f| f.data_type)
    }

    pub fn created_field(&self) -> String {
        format!("{}_created", self.name)
    }

    pub fn modified_field(&self) -> String {
        format!("{}_modified", self.name)
    }

    /// Creation/modification stamps are maintained by storage
    pub fn is_audit_field(&self, name: &str) -> bool {
        name.strip_prefix(self.name.as_str())
            .is_some_and(|rest| rest == "_created" || rest == "_modified")
    }

    pub fn flag_field(&self) -> String {
        format!("{}_flag", self.name)
    }

    pub fn flag_bit(&self, flag: &str) -> Option<i64> {
        self.descriptor.flag.get(flag).copied()
    }

    /// Cache group holding result and point-cache entries of this type
    pub fn cache_group(&self) -> String {
        format!("MODELDATA_{}_{}", self.connection(), self.name).to_ascii_uppercase()
    }

    /// Point-cache key of one primary-key value
    pub fn point_cache_key(&self, primary_value: &Value) -> String {
        format!("PRIMARY_{}", value_to_text(primary_value))
    }

    /// Entry-registry key of one primary-key value
    pub fn registry_key(&self, primary_value: &Value) -> String {
        format!(
            "{}_{}_{}",
            self.name,
            self.connection(),
            value_to_text(primary_value)
        )
        .to_ascii_uppercase()
    }
}
