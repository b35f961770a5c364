//! Value normalization
//!
//! Two directions are covered: values read back from storage are brought
//! into their typed form ([`normalize_value`]), and loosely formatted user
//! input is converted into storage form ([`import_value`]).

use crate::types::DataType;
use chrono::NaiveDate;
use serde_json::{Number, Value};

/// Date sentinels that count as "no value"
pub const ZERO_DATES: [&str; 3] = ["0000-00-00", "0000", "0000-00-00 00:00:00"];

/// Text form of a value as used in masks, cache keys and record ids
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Null, empty text, empty collections and zero-date sentinels
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || ZERO_DATES.contains(&s.as_str()),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Equality that treats numeric text and numbers, and booleans and
/// their 0/1 forms, as the same value.
pub fn loosely_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }

    match (left, right) {
        (Value::Null, other) | (other, Value::Null) => is_empty_value(other),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), s.trim().parse::<f64>()) {
                (Some(a), Ok(b)) => a == b,
                _ => false,
            }
        }
        (Value::Bool(b), Value::Number(n)) | (Value::Number(n), Value::Bool(b)) => {
            n.as_f64().is_some_and(|f| (f != 0.0) == *b)
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            parse_bool(s) == Some(*b)
        }
        _ => false,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn float_value(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

/// Bring a stored value into its typed form.
///
/// Structure text is decoded (malformed text becomes null), numeric text
/// becomes a number and boolean spellings become booleans. Values that do
/// not parse are returned unchanged.
pub fn normalize_value(data_type: DataType, value: Value) -> Value {
    match data_type {
        DataType::Structure => match value {
            Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::Null),
            other => other,
        },
        DataType::Number => match &value {
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(float_value)
                .unwrap_or(value),
            Value::Number(n) => n.as_f64().and_then(float_value).unwrap_or(value),
            _ => value,
        },
        DataType::NumberNatural | DataType::NumberInteger | DataType::NumberPort => match &value {
            Value::String(text) => parse_integer(text).map(Value::from).unwrap_or(value),
            Value::Number(n) if n.as_i64().is_none() => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| Value::from(f as i64))
                .unwrap_or(value),
            _ => value,
        },
        DataType::Boolean => match &value {
            Value::String(text) => parse_bool(text).map(Value::Bool).unwrap_or(value),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Value::Bool(false),
                Some(1) => Value::Bool(true),
                _ => value,
            },
            _ => value,
        },
        DataType::Text
        | DataType::TextDomain
        | DataType::TextDate
        | DataType::TextTimestamp
        | DataType::Date
        | DataType::File => value,
    }
}

/// Convert a human-formatted input value into storage form.
pub fn import_value(data_type: DataType, value: Value) -> Value {
    match data_type {
        DataType::Boolean => match value {
            Value::Bool(b) => Value::Bool(b),
            Value::String(ref s) if s == "true" => Value::Bool(true),
            Value::String(ref s) if s == "false" => Value::Bool(false),
            _ => Value::Null,
        },
        DataType::NumberNatural => {
            let number = match &value {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
                Value::String(s) => parse_integer(s).or_else(|| {
                    s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64)
                }),
                Value::Bool(b) => Some(i64::from(*b)),
                _ => None,
            };
            Value::from(number.unwrap_or(0))
        }
        DataType::TextDate => {
            if is_empty_value(&value) {
                return Value::Null;
            }
            match &value {
                Value::String(s) => match NaiveDate::parse_from_str(s.trim(), "%d.%m.%Y") {
                    Ok(date) => Value::String(date.format("%Y-%m-%d").to_string()),
                    Err(_) => value,
                },
                _ => value,
            }
        }
        DataType::Text
        | DataType::TextDomain
        | DataType::TextTimestamp
        | DataType::Date
        | DataType::Number
        | DataType::NumberInteger
        | DataType::NumberPort
        | DataType::Structure
        | DataType::File => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values() {
        for value in [
            json!(null),
            json!(""),
            json!([]),
            json!({}),
            json!("0000-00-00"),
            json!("0000"),
            json!("0000-00-00 00:00:00"),
        ] {
            assert!(is_empty_value(&value), "{} should be empty", value);
        }
        for value in [json!(0), json!(false), json!("0"), json!(" "), json!([null])] {
            assert!(!is_empty_value(&value), "{} should not be empty", value);
        }
    }

    #[test]
    fn test_loose_equality() {
        assert!(loosely_equal(&json!(7), &json!("7")));
        assert!(loosely_equal(&json!("7.0"), &json!(7)));
        assert!(loosely_equal(&json!(2.0), &json!(2)));
        assert!(loosely_equal(&json!(true), &json!(1)));
        assert!(loosely_equal(&json!(false), &json!("0")));
        assert!(loosely_equal(&json!(null), &json!("")));
        assert!(!loosely_equal(&json!("a"), &json!("b")));
        assert!(!loosely_equal(&json!(null), &json!(0)));
        assert!(!loosely_equal(&json!({"a": 1}), &json!({"a": 2})));
    }

    #[test]
    fn test_structure_decoding() {
        assert_eq!(
            normalize_value(DataType::Structure, json!("{\"tags\":[\"a\",\"b\"]}")),
            json!({"tags": ["a", "b"]})
        );
        assert_eq!(
            normalize_value(DataType::Structure, json!("{broken")),
            Value::Null
        );
        // already decoded by the driver
        assert_eq!(
            normalize_value(DataType::Structure, json!({"x": 1})),
            json!({"x": 1})
        );
    }

    #[test]
    fn test_number_normalization() {
        assert_eq!(normalize_value(DataType::Number, json!("2.5")), json!(2.5));
        assert_eq!(normalize_value(DataType::Number, json!("abc")), json!("abc"));
        assert_eq!(normalize_value(DataType::NumberNatural, json!("42")), json!(42));
        assert_eq!(normalize_value(DataType::NumberInteger, json!(-3.0)), json!(-3));
        assert_eq!(normalize_value(DataType::NumberPort, json!("x")), json!("x"));
    }

    #[test]
    fn test_boolean_normalization() {
        assert_eq!(normalize_value(DataType::Boolean, json!("t")), json!(true));
        assert_eq!(normalize_value(DataType::Boolean, json!(0)), json!(false));
        assert_eq!(normalize_value(DataType::Boolean, json!("maybe")), json!("maybe"));
    }

    #[test]
    fn test_text_untouched() {
        assert_eq!(normalize_value(DataType::Text, json!("42")), json!("42"));
        assert_eq!(normalize_value(DataType::TextDate, json!("2024-01-31")), json!("2024-01-31"));
    }

    #[test]
    fn test_import_boolean() {
        assert_eq!(import_value(DataType::Boolean, json!("true")), json!(true));
        assert_eq!(import_value(DataType::Boolean, json!("false")), json!(false));
        assert_eq!(import_value(DataType::Boolean, json!("on")), Value::Null);
    }

    #[test]
    fn test_import_natural() {
        assert_eq!(import_value(DataType::NumberNatural, json!("12")), json!(12));
        assert_eq!(import_value(DataType::NumberNatural, json!("12.9")), json!(12));
        assert_eq!(import_value(DataType::NumberNatural, json!("abc")), json!(0));
    }

    #[test]
    fn test_import_date() {
        assert_eq!(
            import_value(DataType::TextDate, json!("31.01.2024")),
            json!("2024-01-31")
        );
        assert_eq!(
            import_value(DataType::TextDate, json!("2024-01-31")),
            json!("2024-01-31")
        );
        assert_eq!(import_value(DataType::TextDate, json!("")), Value::Null);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("jo")), "jo");
        assert_eq!(value_to_text(&json!(7)), "7");
        assert_eq!(value_to_text(&json!(null)), "");
        assert_eq!(value_to_text(&json!([1, 2])), "[1,2]");
    }
}
