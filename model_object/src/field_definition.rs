use crate::schema::{FieldSchema, SchemaDescriptor};
use serde::Serialize;
use serde_json::Value;
use type_mapping::{DataType, ValidatorOptions};

/// Static descriptor of one column, derived once from the schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub display_name: String,
    pub data_type: DataType,
    pub display_type: String,
    pub required: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub unique: bool,
    pub foreign: Vec<String>,
    pub readonly: bool,
    pub allowed: Vec<String>,
    pub default_value: Option<Value>,
}

impl FieldDefinition {
    /// Build the definition of `name`; the primary key is always readonly
    pub fn from_schema(name: &str, field: &FieldSchema, descriptor: &SchemaDescriptor) -> Self {
        let is_primary = descriptor.primary_key() == Some(name);
        Self {
            name: name.to_string(),
            display_name: field
                .display_name
                .clone()
                .unwrap_or_else(|| name.to_string()),
            data_type: field.data_type,
            display_type: field
                .display_type
                .clone()
                .unwrap_or_else(|| field.data_type.to_string()),
            required: field.required || descriptor.required.iter().any(|r| r == name),
            min: field.min,
            max: field.max,
            unique: field.unique || is_primary,
            foreign: field.foreign.clone(),
            readonly: field.readonly || is_primary,
            allowed: field.allowed.clone(),
            default_value: field.default.clone(),
        }
    }

    pub fn validator_options(&self, null_allowed: bool) -> ValidatorOptions {
        ValidatorOptions {
            null_allowed,
            min: self.min,
            max: self.max,
            allowed: self.allowed.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_forced_readonly() {
        let descriptor = SchemaDescriptor::from_json(
            r#"{
                "primary": ["item_id"],
                "required": ["item_name"],
                "fields": {
                    "item_id": {"type": "number_natural", "readonly": false},
                    "item_name": {"type": "text", "min": 2, "max": 40, "enum": ["a", "b"]}
                }
            }"#,
        )
        .unwrap();

        let (name, schema) = &descriptor.fields[0];
        let id = FieldDefinition::from_schema(name, schema, &descriptor);
        assert!(id.readonly);
        assert!(id.unique);
        assert!(!id.required);
        assert_eq!(id.display_type, "number_natural");
        assert_eq!(id.display_name, "item_id");

        let (name, schema) = &descriptor.fields[1];
        let item_name = FieldDefinition::from_schema(name, schema, &descriptor);
        assert!(item_name.required);
        assert!(!item_name.readonly);

        let options = item_name.validator_options(false);
        assert_eq!(options.min, Some(2));
        assert_eq!(options.max, Some(40));
        assert_eq!(options.allowed, vec!["a".to_string(), "b".to_string()]);
        assert!(!options.null_allowed);
    }
}
