//! Schema descriptors
//!
//! A model's schema is a JSON document naming its connection, primary key,
//! required fields, flag bits and field definitions:
//!
//! ```json
//! {
//!   "connection": "default",
//!   "primary": ["user_id"],
//!   "required": ["user_email"],
//!   "flag": {"active": 1, "admin": 2},
//!   "fields": {
//!     "user_id":    {"type": "number_natural"},
//!     "user_email": {"type": "text", "max": 255, "unique": true},
//!     "user_flag":  {"type": "number_natural"}
//!   }
//! }
//! ```

use crate::errors::{ModelhausError, Result};
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::path::PathBuf;
use type_mapping::DataType;

pub const DEFAULT_CONNECTION: &str = "default";

fn default_connection() -> String {
    DEFAULT_CONNECTION.to_string()
}

/// Schema entry of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub foreign: Vec<String>,
    #[serde(default, rename = "enum")]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

impl FieldSchema {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            display_name: None,
            display_type: None,
            required: false,
            min: None,
            max: None,
            unique: false,
            foreign: Vec::new(),
            allowed: Vec::new(),
            readonly: false,
            default: None,
        }
    }
}

/// Parsed schema of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default = "default_connection")]
    pub connection: String,
    pub primary: Vec<String>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub flag: BTreeMap<String, i64>,
    /// Field schemas in declaration order
    #[serde(
        deserialize_with = "deserialize_fields",
        serialize_with = "serialize_fields"
    )]
    pub fields: Vec<(String, FieldSchema)>,
}

fn deserialize_fields<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, FieldSchema)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FieldsVisitor;

    impl<'de> Visitor<'de> for FieldsVisitor {
        type Value = Vec<(String, FieldSchema)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of field names to field schemas")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, schema)) = map.next_entry::<String, FieldSchema>()? {
                fields.push((name, schema));
            }
            Ok(fields)
        }
    }

    deserializer.deserialize_map(FieldsVisitor)
}

fn serialize_fields<S>(fields: &[(String, FieldSchema)], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (name, schema) in fields {
        map.serialize_entry(name, schema)?;
    }
    map.end()
}

impl SchemaDescriptor {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// The single primary-key field name
    pub fn primary_key(&self) -> Option<&str> {
        self.primary.first().map(String::as_str)
    }

    /// Structural checks run once when a model is first resolved
    pub fn validate(&self, model: &str) -> Result<()> {
        let invalid = |message: String| ModelhausError::configuration(model, message);

        ValidatedTableName::new(model).map_err(|e| invalid(e.to_string()))?;

        if self.connection.is_empty() {
            return Err(invalid("connection name cannot be empty".into()));
        }
        if self.fields.is_empty() {
            return Err(invalid("schema declares no fields".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for (name, _) in &self.fields {
            ValidatedFieldName::new(name).map_err(|e| invalid(e.to_string()))?;
            if !seen.insert(name.as_str()) {
                return Err(invalid(format!("field '{}' is declared twice", name)));
            }
        }

        match self.primary.as_slice() {
            [key] if self.field(key).is_some() => {}
            [key] => {
                return Err(invalid(format!("primary key '{}' is not a declared field", key)));
            }
            _ => return Err(invalid("exactly one primary key field is required".into())),
        }

        if let Some(missing) = self.required.iter().find(|r| self.field(r).is_none()) {
            return Err(invalid(format!("required field '{}' is not declared", missing)));
        }

        if let Some((name, bit)) = self.flag.iter().find(|(_, bit)| **bit <= 0) {
            return Err(invalid(format!("flag '{}' has non-positive value {}", name, bit)));
        }

        for (name, schema) in &self.fields {
            if let (Some(min), Some(max)) = (schema.min, schema.max) {
                if min > max {
                    return Err(invalid(format!("field '{}' has min {} above max {}", name, min, max)));
                }
            }
        }

        Ok(())
    }
}

/// Resolves a model name to its schema descriptor
pub trait SchemaSource: Send + Sync + Debug {
    fn load(&self, model: &str) -> Result<SchemaDescriptor>;
}

/// Reads `<dir>/<schema_name>_<model>.json`
#[derive(Debug, Clone)]
pub struct JsonFileSchemaSource {
    dir: PathBuf,
    schema_name: String,
}

impl JsonFileSchemaSource {
    pub fn new(dir: impl Into<PathBuf>, schema_name: &str) -> Self {
        Self {
            dir: dir.into(),
            schema_name: schema_name.to_string(),
        }
    }

    pub fn path_for(&self, model: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.schema_name, model))
    }
}

impl SchemaSource for JsonFileSchemaSource {
    fn load(&self, model: &str) -> Result<SchemaDescriptor> {
        let path = self.path_for(model);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            ModelhausError::configuration(model, format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            ModelhausError::configuration(model, format!("cannot parse {}: {}", path.display(), e))
        })
    }
}

/// Descriptors registered in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    descriptors: HashMap<String, SchemaDescriptor>,
}

impl StaticSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: &str, descriptor: SchemaDescriptor) -> Self {
        self.descriptors.insert(model.to_string(), descriptor);
        self
    }

    pub fn with_json(self, model: &str, text: &str) -> Result<Self> {
        let descriptor = SchemaDescriptor::from_json(text)
            .map_err(|e| ModelhausError::configuration(model, e.to_string()))?;
        Ok(self.with_model(model, descriptor))
    }
}

impl SchemaSource for StaticSchemaSource {
    fn load(&self, model: &str) -> Result<SchemaDescriptor> {
        self.descriptors
            .get(model)
            .cloned()
            .ok_or_else(|| ModelhausError::configuration(model, "no schema registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER: &str = r#"{
        "primary": ["user_id"],
        "required": ["user_email"],
        "flag": {"active": 1, "admin": 2},
        "fields": {
            "user_id": {"type": "number_natural"},
            "user_email": {"type": "text", "max": 255, "unique": true, "displayName": "E-Mail"},
            "user_flag": {"type": "number_natural"},
            "user_created": {"type": "text_timestamp"}
        }
    }"#;

    #[test]
    fn test_parse_keeps_declaration_order() {
        let schema = SchemaDescriptor::from_json(USER).unwrap();
        let names: Vec<&str> = schema.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["user_id", "user_email", "user_flag", "user_created"]);
        assert_eq!(schema.connection, DEFAULT_CONNECTION);
        assert_eq!(schema.primary_key(), Some("user_id"));

        let email = schema.field("user_email").unwrap();
        assert_eq!(email.max, Some(255));
        assert!(email.unique);
        assert_eq!(email.display_name.as_deref(), Some("E-Mail"));
    }

    #[test]
    fn test_serialization_round_trip_keeps_order() {
        let schema = SchemaDescriptor::from_json(USER).unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        let text = serde_json::to_string(&value).unwrap();
        let back = SchemaDescriptor::from_json(&text).unwrap();
        assert_eq!(back.fields.len(), 4);
        assert_eq!(back.flag, schema.flag);
    }

    #[test]
    fn test_valid_schema() {
        let schema = SchemaDescriptor::from_json(USER).unwrap();
        assert!(schema.validate("user").is_ok());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let text = json!({
            "primary": ["id"],
            "fields": {"id": {"type": "blob"}}
        })
        .to_string();
        assert!(SchemaDescriptor::from_json(&text).is_err());
    }

    #[test]
    fn test_structural_failures() {
        let base = SchemaDescriptor::from_json(USER).unwrap();

        let mut schema = base.clone();
        schema.primary = vec!["missing".into()];
        assert!(matches!(
            schema.validate("user"),
            Err(ModelhausError::Configuration { .. })
        ));

        let mut schema = base.clone();
        schema.primary.push("user_email".into());
        assert!(schema.validate("user").is_err());

        let mut schema = base.clone();
        schema.required.push("nope".into());
        assert!(schema.validate("user").is_err());

        let mut schema = base.clone();
        schema.flag.insert("broken".into(), 0);
        assert!(schema.validate("user").is_err());

        let mut schema = base.clone();
        schema.fields.push(("bad-name".into(), FieldSchema::new(DataType::Text)));
        assert!(schema.validate("user").is_err());

        assert!(base.validate("select").is_err());
    }

    #[test]
    fn test_static_source() {
        let source = StaticSchemaSource::new().with_json("user", USER).unwrap();
        assert!(source.load("user").is_ok());
        assert!(matches!(
            source.load("order"),
            Err(ModelhausError::Configuration { .. })
        ));
    }

    #[test]
    fn test_file_source_path() {
        let source = JsonFileSchemaSource::new("config/model", "public");
        assert_eq!(
            source.path_for("user"),
            PathBuf::from("config/model/public_user.json")
        );
        assert!(matches!(
            source.load("definitely_missing"),
            Err(ModelhausError::Configuration { .. })
        ));
    }
}
