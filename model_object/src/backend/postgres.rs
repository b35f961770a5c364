//! PostgreSQL backend on top of sqlx

use crate::backend::{Row, StorageBackend};
use crate::errors::{ModelhausError, Result};
use crate::query_builder::{Parameters, Query};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};
use type_mapping::{value_to_text, DataType};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Bind a parameter of unknown column type, guessing from its JSON shape
macro_rules! bind_json_param {
    ($query:expr, $param:expr) => {
        match $param {
            Value::String(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    $query.bind(dt.with_timezone(&Utc))
                } else if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                    $query.bind(uuid)
                } else {
                    $query.bind(s)
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    $query.bind(i)
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            Value::Bool(b) => $query.bind(b),
            Value::Null => $query.bind(Option::<String>::None),
            other => $query.bind(sqlx::types::Json(other)),
        }
    };
}

#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn prepare<'q>(sql: &'q str, keys: &[String], parameters: &Parameters) -> PgQuery<'q> {
        let mut query = sqlx::query(sql);
        for key in keys {
            let value = parameters.get(key).cloned().unwrap_or(Value::Null);
            query = bind_value(query, value, parameters.data_type(key));
        }
        query
    }
}

#[async_trait]
impl StorageBackend for PgBackend {
    async fn read(&self, text: &str, parameters: &Parameters) -> Result<Vec<Row>> {
        let (sql, keys) = to_positional(text, parameters)?;
        crate::trace_log!("Executing read: {}", sql);

        let rows = Self::prepare(&sql, &keys, parameters)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn write(&self, query: &Query) -> Result<u64> {
        let (sql, keys) = to_positional(&query.text, &query.parameters)?;
        crate::trace_log!("Executing write: {}", sql);

        let result = Self::prepare(&sql, &keys, &query.parameters)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Rewrite `:name` placeholders to `$n`, returning the parameter names in
/// position order. Quoted literals, quoted identifiers and `::` casts are
/// left alone; a repeated name reuses its position.
pub fn to_positional(text: &str, parameters: &Parameters) -> Result<(String, Vec<String>)> {
    let mut sql = String::with_capacity(text.len());
    let mut keys: Vec<String> = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                sql.push(c);
                for inner in chars.by_ref() {
                    sql.push(inner);
                    if inner == c {
                        break;
                    }
                }
            }
            ':' if chars.peek() == Some(&':') => {
                sql.push_str("::");
                chars.next();
            }
            ':' if chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
            {
                let mut name = String::new();
                while let Some(n) = chars.peek().copied() {
                    if !(n.is_ascii_alphanumeric() || n == '_') {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }

                if !parameters.contains_key(&name) {
                    return Err(ModelhausError::QueryCompilation(format!(
                        "statement references unbound parameter ':{}'",
                        name
                    )));
                }

                let position = match keys.iter().position(|k| *k == name) {
                    Some(i) => i + 1,
                    None => {
                        keys.push(name);
                        keys.len()
                    }
                };
                sql.push('$');
                sql.push_str(&position.to_string());
            }
            _ => sql.push(c),
        }
    }

    Ok((sql, keys))
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(true),
            "false" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Null typed after the target column so Postgres accepts it
fn bind_null(query: PgQuery<'_>, data_type: Option<DataType>) -> PgQuery<'_> {
    match data_type {
        Some(DataType::Number) => query.bind(Option::<f64>::None),
        Some(DataType::NumberNatural | DataType::NumberInteger | DataType::NumberPort) => {
            query.bind(Option::<i64>::None)
        }
        Some(DataType::Boolean) => query.bind(Option::<bool>::None),
        Some(DataType::Date | DataType::TextDate) => query.bind(Option::<NaiveDate>::None),
        Some(DataType::TextTimestamp) => query.bind(Option::<DateTime<Utc>>::None),
        Some(DataType::Structure) => query.bind(Option::<sqlx::types::Json<Value>>::None),
        Some(DataType::Text | DataType::TextDomain | DataType::File) | None => {
            query.bind(Option::<String>::None)
        }
    }
}

/// Bind `value` as the Rust type matching the column's data type, falling
/// back to shape-based binding when the value does not parse
fn bind_value(query: PgQuery<'_>, value: Value, data_type: Option<DataType>) -> PgQuery<'_> {
    if value.is_null() {
        return bind_null(query, data_type);
    }

    match data_type {
        Some(DataType::Number) => match as_f64(&value) {
            Some(f) => query.bind(f),
            None => bind_json_param!(query, value),
        },
        Some(DataType::NumberNatural | DataType::NumberInteger | DataType::NumberPort) => {
            match as_i64(&value) {
                Some(i) => query.bind(i),
                None => bind_json_param!(query, value),
            }
        }
        Some(DataType::Boolean) => match as_bool(&value) {
            Some(b) => query.bind(b),
            None => bind_json_param!(query, value),
        },
        Some(DataType::Date | DataType::TextDate) => {
            match NaiveDate::parse_from_str(value_to_text(&value).trim(), "%Y-%m-%d") {
                Ok(date) => query.bind(date),
                Err(_) => query.bind(value_to_text(&value)),
            }
        }
        Some(DataType::TextTimestamp) => match parse_timestamp(value_to_text(&value).trim()) {
            Some(ts) => query.bind(ts),
            None => query.bind(value_to_text(&value)),
        },
        Some(DataType::Structure) => {
            let document = match value {
                Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
                other => other,
            };
            query.bind(sqlx::types::Json(document))
        }
        Some(DataType::Text | DataType::TextDomain | DataType::File) => {
            query.bind(value_to_text(&value))
        }
        None => bind_json_param!(query, value),
    }
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(|f| Value::from(f64::from(f))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)?
            .map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|ts| Value::String(ts.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|ts| Value::String(ts.format("%Y-%m-%d %H:%M:%S").to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        other => match row.try_get::<Option<String>, _>(index) {
            Ok(text) => text.map(Value::String),
            Err(e) => {
                tracing::warn!("Column {} of type {} read as null: {}", index, other, e);
                None
            }
        },
    };

    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parameters(keys: &[&str]) -> Parameters {
        let mut parameters = Parameters::new();
        for key in keys {
            parameters.bind(key, json!(1), None);
        }
        parameters
    }

    #[test]
    fn test_placeholders_become_positional() {
        let (sql, keys) = to_positional(
            "SELECT * FROM \"user\" WHERE TRUE AND \"user\".\"a\" = :user_FILTER_a AND \"user\".\"b\" > :user_FILTER_b",
            &parameters(&["user_FILTER_a", "user_FILTER_b"]),
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"user\" WHERE TRUE AND \"user\".\"a\" = $1 AND \"user\".\"b\" > $2"
        );
        assert_eq!(keys, ["user_FILTER_a", "user_FILTER_b"]);
    }

    #[test]
    fn test_repeated_placeholder_reuses_position() {
        let (sql, keys) = to_positional("SELECT :a, :b, :a", &parameters(&["a", "b"])).unwrap();
        assert_eq!(sql, "SELECT $1, $2, $1");
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_literals_identifiers_and_casts_untouched() {
        let (sql, keys) = to_positional(
            "SELECT ':a' AS \"x:y\", v::text FROM t WHERE c IN ('it''s :b') AND d = :a",
            &parameters(&["a"]),
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT ':a' AS \"x:y\", v::text FROM t WHERE c IN ('it''s :b') AND d = $1"
        );
        assert_eq!(keys, ["a"]);
    }

    #[test]
    fn test_unbound_placeholder_is_rejected() {
        let result = to_positional("SELECT :missing", &Parameters::new());
        assert!(matches!(result, Err(ModelhausError::QueryCompilation(_))));
    }

    #[test]
    fn test_value_coercion_helpers() {
        assert_eq!(as_i64(&json!("7")), Some(7));
        assert_eq!(as_i64(&json!(7.0)), Some(7));
        assert_eq!(as_f64(&json!("2.5")), Some(2.5));
        assert_eq!(as_bool(&json!("t")), Some(true));
        assert_eq!(as_bool(&json!(0)), Some(false));
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
