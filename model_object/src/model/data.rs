use super::Model;
use crate::backend::Row;
use crate::entry::Entry;
use crate::errors::InvalidField;
use crate::field_definition::FieldDefinition;
use serde_json::Value;
use type_mapping::{import_value, is_empty_value, normalize_value};

/// Where [`Model::is_flag`] reads the current bitmask from
#[derive(Debug, Clone, Copy)]
pub enum FlagSource<'a> {
    Entry(&'a Entry),
    Row(&'a Row),
    Raw(i64),
}

impl<'a> From<&'a Entry> for FlagSource<'a> {
    fn from(entry: &'a Entry) -> Self {
        FlagSource::Entry(entry)
    }
}

impl<'a> From<&'a Row> for FlagSource<'a> {
    fn from(row: &'a Row) -> Self {
        FlagSource::Row(row)
    }
}

impl From<i64> for FlagSource<'_> {
    fn from(raw: i64) -> Self {
        FlagSource::Raw(raw)
    }
}

fn flag_bits(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.trim(), "" | "0" | "false"),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Model {
    /// Bring a fetched row into typed form using the field types
    pub fn normalize_row(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(name, value)| {
                let value = match self.field_type(&name) {
                    Some(data_type) => normalize_value(data_type, value),
                    None => value,
                };
                (name, value)
            })
            .collect()
    }

    /// Convert form-style input into storage form.
    ///
    /// Keys `<field>__<key>` are collected into an object under `<field>`
    /// when `<field>_` is present, a map of flag names on the flag column is
    /// folded into its bitmask, and each remaining field value is imported
    /// according to its type.
    pub fn normalize_data(&self, data: &Row) -> Row {
        let definition = self.definition();
        let flag_field = definition.flag_field();
        let mut imported = Row::new();

        for field in definition.fields() {
            let name = field.name.as_str();

            if data.contains_key(&format!("{}_", name)) {
                let prefix = format!("{}__", name);
                let collected: Row = data
                    .iter()
                    .filter_map(|(key, value)| {
                        key.to_ascii_lowercase()
                            .strip_prefix(&prefix)
                            .map(|rest| (rest.to_string(), value.clone()))
                    })
                    .collect();
                imported.insert(name.to_string(), Value::Object(collected));
            }

            if name == flag_field {
                match data.get(name) {
                    Some(Value::Object(flags)) => {
                        let bits = flags
                            .iter()
                            .filter(|(_, status)| is_checked(status))
                            .filter_map(|(flag, _)| definition.flag_bit(flag))
                            .fold(0, |mask, bit| mask | bit);
                        imported.insert(name.to_string(), Value::from(bits));
                    }
                    Some(value @ Value::Number(_)) => {
                        imported.insert(name.to_string(), value.clone());
                    }
                    _ => {}
                }
                continue;
            }

            if let Some(value) = data.get(name).filter(|v| !v.is_null()) {
                imported.insert(name.to_string(), import_value(field.data_type, value.clone()));
            }
        }

        imported
    }

    /// Validate `data` against every writable field; the primary key and
    /// audit stamps are skipped and missing fields count as null
    pub fn validate(&self, data: &Row) -> Vec<InvalidField> {
        let definition = self.definition();
        definition
            .fields()
            .iter()
            .filter(|f| f.name != definition.primary_key() && !definition.is_audit_field(&f.name))
            .filter_map(|f| {
                let value = data.get(&f.name).cloned().unwrap_or(Value::Null);
                self.validate_field(f, value)
            })
            .collect()
    }

    fn validate_field(&self, field: &FieldDefinition, value: Value) -> Option<InvalidField> {
        if is_empty_value(&value) {
            return field.required.then(|| {
                InvalidField::new(&field.name, value, vec!["field is required".to_string()])
            });
        }

        let errors = self.context.validators().validate(
            field.data_type,
            &value,
            &field.validator_options(!field.required),
        );
        (!errors.is_empty()).then(|| InvalidField::new(&field.name, value, errors))
    }

    /// Whether every bit of `bit` is set in the source's flag column. A zero
    /// bit or an empty flag column never matches.
    pub fn is_flag<'a>(&self, bit: i64, source: impl Into<FlagSource<'a>>) -> bool {
        let flag_field = self.definition().flag_field();
        let current = match source.into() {
            FlagSource::Entry(entry) => flag_bits(entry.get(&flag_field)),
            FlagSource::Row(row) => flag_bits(row.get(&flag_field)),
            FlagSource::Raw(raw) => raw,
        };
        bit != 0 && current != 0 && (current & bit) == bit
    }
}
