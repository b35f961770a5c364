use cache_system::CacheError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidField {
    pub field: String,
    pub value: Value,
    pub errors: Vec<String>,
}

impl InvalidField {
    pub fn new(field: &str, value: Value, errors: Vec<String>) -> Self {
        Self {
            field: field.to_string(),
            value,
            errors,
        }
    }

    /// Field-specific error code, e.g. `EXCEPTION_INVALID_USER_EMAIL`
    pub fn code(&self) -> String {
        format!("EXCEPTION_INVALID_{}", self.field.to_ascii_uppercase())
    }
}

impl fmt::Display for InvalidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: invalid value {} for field '{}' ({})",
            self.code(),
            self.value,
            self.field,
            self.errors.join("; ")
        )
    }
}

impl std::error::Error for InvalidField {}

#[derive(Error, Debug)]
pub enum ModelhausError {
    #[error("{0}")]
    InvalidField(#[from] InvalidField),

    #[error("Invalid data: {}", describe_fields(.0))]
    InvalidData(Vec<InvalidField>),

    #[error("Configuration error for model '{model}': {message}")]
    Configuration { model: String, message: String },

    #[error("Query compilation error: {0}")]
    QueryCompilation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Entry of model '{entry}' cannot be saved through model '{model}'")]
    ModelMismatch { entry: String, model: String },

    #[error("Internal error: {0}")]
    InternalServerError(String),
}

fn describe_fields(fields: &[InvalidField]) -> String {
    fields
        .iter()
        .map(|f| f.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ModelhausError {
    pub fn configuration(model: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            model: model.to_string(),
            message: message.into(),
        }
    }

    pub fn database_operation(table: &str, operation: &str, error: impl fmt::Display) -> Self {
        Self::DatabaseError(format!("{} on '{}' failed: {}", operation, table, error))
    }

    /// Field failures carried by `InvalidField` and `InvalidData`
    pub fn invalid_fields(&self) -> Vec<&InvalidField> {
        match self {
            Self::InvalidField(field) => vec![field],
            Self::InvalidData(fields) => fields.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl From<sqlx::Error> for ModelhausError {
    fn from(error: sqlx::Error) -> Self {
        Self::DatabaseError(error.to_string())
    }
}

impl From<serde_json::Error> for ModelhausError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModelhausError>;
