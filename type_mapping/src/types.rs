//! Field data types
//!
//! Schema descriptors name a field's type with a lower-case token; this
//! module maps those tokens onto [`DataType`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown data type '{0}'")]
pub struct UnknownDataType(pub String);

/// Data type of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Text,          // text
    TextDomain,    // text_domain
    TextDate,      // text_date (YYYY-MM-DD)
    TextTimestamp, // text_timestamp
    Date,          // date
    Number,        // number (floating point)
    NumberNatural, // number_natural (>= 0)
    NumberInteger, // number_integer
    NumberPort,    // number_port (1..=65535)
    Structure,     // structure (JSON text)
    Boolean,       // boolean
    File,          // file
}

impl DataType {
    pub const ALL: [DataType; 12] = [
        DataType::Text,
        DataType::TextDomain,
        DataType::TextDate,
        DataType::TextTimestamp,
        DataType::Date,
        DataType::Number,
        DataType::NumberNatural,
        DataType::NumberInteger,
        DataType::NumberPort,
        DataType::Structure,
        DataType::Boolean,
        DataType::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::TextDomain => "text_domain",
            DataType::TextDate => "text_date",
            DataType::TextTimestamp => "text_timestamp",
            DataType::Date => "date",
            DataType::Number => "number",
            DataType::NumberNatural => "number_natural",
            DataType::NumberInteger => "number_integer",
            DataType::NumberPort => "number_port",
            DataType::Structure => "structure",
            DataType::Boolean => "boolean",
            DataType::File => "file",
        }
    }

    /// True for every `number*` type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Number
                | DataType::NumberNatural
                | DataType::NumberInteger
                | DataType::NumberPort
        )
    }

    /// True for whole-number types
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataType::NumberNatural | DataType::NumberInteger | DataType::NumberPort
        )
    }
}

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

impl TryFrom<String> for DataType {
    type Error = UnknownDataType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
