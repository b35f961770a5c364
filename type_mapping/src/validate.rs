//! Field value validators
//!
//! Every data type has a validator that reports a list of messages for a
//! value; an empty list means the value is acceptable. Applications can
//! replace the built-in validator of any type through [`ValidatorSet`].

use crate::types::DataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Options passed to a validator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatorOptions {
    pub null_allowed: bool,
    /// Lower bound: length for text, value for numbers
    pub min: Option<i64>,
    /// Upper bound: length for text, value for numbers
    pub max: Option<i64>,
    /// Allowed values, compared by text form
    pub allowed: Vec<String>,
}

impl ValidatorOptions {
    pub fn nullable(null_allowed: bool) -> Self {
        Self {
            null_allowed,
            ..Self::default()
        }
    }
}

pub trait FieldValidator: Send + Sync + Debug {
    fn validate(&self, value: &Value, options: &ValidatorOptions) -> Vec<String>;
}

/// Validator capability keyed by data type
#[derive(Debug, Clone)]
pub struct ValidatorSet {
    validators: HashMap<DataType, Arc<dyn FieldValidator>>,
}

impl ValidatorSet {
    /// Built-in validators for every data type
    pub fn with_defaults() -> Self {
        let validators = DataType::ALL
            .iter()
            .map(|t| (*t, Arc::new(TypeValidator(*t)) as Arc<dyn FieldValidator>))
            .collect();
        Self { validators }
    }

    /// Replace the validator of one data type
    pub fn register(&mut self, data_type: DataType, validator: Arc<dyn FieldValidator>) {
        self.validators.insert(data_type, validator);
    }

    pub fn validate(
        &self,
        data_type: DataType,
        value: &Value,
        options: &ValidatorOptions,
    ) -> Vec<String> {
        match self.validators.get(&data_type) {
            Some(validator) => validator.validate(value, options),
            None => TypeValidator(data_type).validate(value, options),
        }
    }
}

impl Default for ValidatorSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Built-in validator for one data type
#[derive(Debug, Clone, Copy)]
pub struct TypeValidator(pub DataType);

impl FieldValidator for TypeValidator {
    fn validate(&self, value: &Value, options: &ValidatorOptions) -> Vec<String> {
        if value.is_null() {
            return if options.null_allowed {
                Vec::new()
            } else {
                vec!["value must not be null".to_string()]
            };
        }

        let mut errors = match self.0 {
            DataType::Text | DataType::File => check_text(value, options),
            DataType::TextDomain => check_domain(value, options),
            DataType::TextDate | DataType::Date => check_date(value),
            DataType::TextTimestamp => check_timestamp(value),
            DataType::Number => check_number(value, options),
            DataType::NumberNatural => check_integer(value, options, Some(0), None),
            DataType::NumberInteger => check_integer(value, options, None, None),
            DataType::NumberPort => check_integer(value, options, Some(1), Some(65535)),
            DataType::Structure => check_structure(value),
            DataType::Boolean => check_boolean(value),
        };

        if errors.is_empty() && !options.allowed.is_empty() {
            let text = crate::normalize::value_to_text(value);
            if !options.allowed.iter().any(|a| a == &text) {
                errors.push(format!("value '{}' is not one of the allowed values", text));
            }
        }

        errors
    }
}

fn check_text(value: &Value, options: &ValidatorOptions) -> Vec<String> {
    let Value::String(text) = value else {
        return vec![format!("expected text, got {}", value)];
    };

    let mut errors = Vec::new();
    let length = text.chars().count() as i64;
    if let Some(min) = options.min.filter(|m| *m > 0) {
        if length < min {
            errors.push(format!("text is shorter than {} characters", min));
        }
    }
    if let Some(max) = options.max.filter(|m| *m > 0) {
        if length > max {
            errors.push(format!("text is longer than {} characters", max));
        }
    }
    errors
}

fn check_domain(value: &Value, options: &ValidatorOptions) -> Vec<String> {
    let mut errors = check_text(value, options);
    if let Value::String(text) = value {
        let valid = !text.is_empty()
            && text.len() <= 253
            && text.split('.').all(|label| {
                !label.is_empty()
                    && label.len() <= 63
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
        if !valid {
            errors.push(format!("'{}' is not a valid domain name", text));
        }
    }
    errors
}

fn check_date(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() => Vec::new(),
        _ => vec![format!("{} is not a date in YYYY-MM-DD form", value)],
    }
}

fn check_timestamp(value: &Value) -> Vec<String> {
    match value {
        Value::String(text)
            if DateTime::parse_from_rfc3339(text).is_ok()
                || NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok() =>
        {
            Vec::new()
        }
        _ => vec![format!("{} is not a timestamp", value)],
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn check_bounds(number: f64, options: &ValidatorOptions, errors: &mut Vec<String>) {
    if let Some(min) = options.min {
        if number < min as f64 {
            errors.push(format!("value must be at least {}", min));
        }
    }
    if let Some(max) = options.max {
        if number > max as f64 {
            errors.push(format!("value must be at most {}", max));
        }
    }
}

fn check_number(value: &Value, options: &ValidatorOptions) -> Vec<String> {
    let Some(number) = as_f64(value) else {
        return vec![format!("{} is not a number", value)];
    };
    let mut errors = Vec::new();
    check_bounds(number, options, &mut errors);
    errors
}

fn check_integer(
    value: &Value,
    options: &ValidatorOptions,
    floor: Option<i64>,
    ceiling: Option<i64>,
) -> Vec<String> {
    let Some(number) = as_f64(value).filter(|f| f.fract() == 0.0) else {
        return vec![format!("{} is not a whole number", value)];
    };

    let mut errors = Vec::new();
    if floor.is_some_and(|f| number < f as f64) || ceiling.is_some_and(|c| number > c as f64) {
        errors.push(format!("{} is out of range", value));
    }
    check_bounds(number, options, &mut errors);
    errors
}

fn check_structure(value: &Value) -> Vec<String> {
    match value {
        Value::Object(_) | Value::Array(_) => Vec::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(_)) | Ok(Value::Array(_)) => Vec::new(),
            _ => vec!["text is not a JSON object or array".to_string()],
        },
        _ => vec![format!("{} is not a structure", value)],
    }
}

fn check_boolean(value: &Value) -> Vec<String> {
    let valid = match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
        Value::String(s) => matches!(
            s.to_ascii_lowercase().as_str(),
            "true" | "false" | "t" | "f" | "1" | "0"
        ),
        _ => false,
    };
    if valid {
        Vec::new()
    } else {
        vec![format!("{} is not a boolean", value)]
    }
}
