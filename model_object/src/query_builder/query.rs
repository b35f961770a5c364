//! Compiled statements

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use type_mapping::DataType;

/// Named parameters of a statement, with the data type of the column each
/// one is compared against or written to when it is known
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<String, Value>,
    types: BTreeMap<String, DataType>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `base`, suffixing `_2`, `_3`, ... when the name is
    /// taken. Returns the name actually used.
    pub fn bind(&mut self, base: &str, value: Value, data_type: Option<DataType>) -> String {
        let mut key = base.to_string();
        let mut suffix = 2;
        while self.values.contains_key(&key) {
            key = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        self.values.insert(key.clone(), value);
        if let Some(data_type) = data_type {
            self.types.insert(key.clone(), data_type);
        }
        key
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn data_type(&self, key: &str) -> Option<DataType> {
        self.types.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// Statement text with `:name` placeholders plus its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub parameters: Parameters,
}

impl Query {
    pub fn new(text: String, parameters: Parameters) -> Self {
        Self { text, parameters }
    }

    /// Stable hex digest of the statement and its parameter values
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        for (key, value) in self.parameters.iter() {
            hasher.update(b"\n");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.to_string().as_bytes());
        }

        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}
