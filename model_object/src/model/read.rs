use super::Model;
use crate::backend::Row;
use crate::context::SharedEntry;
use crate::entry::Entry;
use crate::errors::Result;
use crate::query_builder::{Query, Slang};
use serde_json::Value;
use type_mapping::is_empty_value;

fn rows_to_value(rows: &[Row]) -> Value {
    Value::Array(rows.iter().cloned().map(Value::Object).collect())
}

fn value_to_rows(value: Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl Model {
    /// Execute the pending clauses and return normalized rows.
    ///
    /// Failures are handed to the error handler and yield no rows. The
    /// query state is reset in every case.
    pub async fn search(&mut self) -> Vec<Row> {
        let max_depth = self.context.settings().max_join_depth;
        let rows = match Slang::search(&self.node, max_depth) {
            Ok(query) => self.execute_read(&query).await,
            Err(e) => {
                self.report("search", &e);
                Vec::new()
            }
        };
        self.reset();
        rows
    }

    /// Number of rows the pending clauses match
    pub async fn count(&mut self) -> usize {
        self.search().await.len()
    }

    /// Row with primary key `key`, empty when missing
    pub async fn load(&mut self, key: impl Into<Value>) -> Row {
        let key = key.into();
        if is_empty_value(&key) {
            self.reset();
            return Row::new();
        }

        let primary_key = self.primary_key().to_string();
        self.add_filter(&primary_key, key).set_limit(1);
        self.search().await.into_iter().next().unwrap_or_default()
    }

    /// Row whose unique `field` equals `value`, empty when missing.
    ///
    /// The lookup is limited to one row. Lookups by primary key go through
    /// the point cache `PRIMARY_<value>`, which is filled on a hit. Other
    /// fields use the result cache.
    pub async fn load_by_unique(&mut self, field: &str, value: impl Into<Value>) -> Row {
        let value = value.into();
        if is_empty_value(&value) || !self.field_exists(field) {
            self.reset();
            return Row::new();
        }

        if field != self.primary_key() {
            self.use_cache(true).add_filter(field, value).set_limit(1);
            return self.search().await.into_iter().next().unwrap_or_default();
        }

        let group = self.definition().cache_group();
        let key = self.definition().point_cache_key(&value);

        match self.context.cache().get(&group, &key).await {
            Ok(Some(Value::Object(row))) => {
                crate::debug_log!("Point cache hit {}/{}", group, key);
                self.reset();
                return self.normalize_row(row);
            }
            Ok(_) => {}
            Err(e) => self.report("point cache read", &e.into()),
        }

        self.add_filter(field, value).set_limit(1);
        let rows = self.search().await;
        if let [row] = rows.as_slice() {
            if let Err(e) = self
                .context
                .cache()
                .set(&group, &key, &Value::Object(row.clone()))
                .await
            {
                self.report("point cache write", &e.into());
            }
        }
        rows.into_iter().next().unwrap_or_default()
    }

    /// Registered entry for `key`, loading and registering it on first use
    pub async fn load_entry(&mut self, key: impl Into<Value>) -> Result<Option<SharedEntry>> {
        let key = key.into();
        if is_empty_value(&key) {
            return Ok(None);
        }

        let registry_key = self.definition().registry_key(&key);
        if let Some(entry) = self.context.registry().entry(&registry_key)? {
            return Ok(Some(entry));
        }

        let primary_key = self.primary_key().to_string();
        let row = self.load_by_unique(&primary_key, key).await;
        if row.is_empty() {
            return Ok(None);
        }

        let entry = self.entry(row);
        self.context
            .registry()
            .register_entry(&registry_key, entry)
            .map(Some)
    }

    /// Entries over every matching row; rows that fail validation are
    /// dropped
    pub async fn entries(&mut self) -> Vec<Entry> {
        let rows = self.search().await;
        rows.into_iter()
            .filter_map(|row| match self.entry_strict(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping invalid {} row: {}", self.model_name(), e);
                    None
                }
            })
            .collect()
    }

    async fn execute_read(&self, query: &Query) -> Vec<Row> {
        let group = self.definition().cache_group();
        let cache_key = format!("RESULT_{}", query.fingerprint());

        if self.use_cache {
            match self.context.cache().get(&group, &cache_key).await {
                Ok(Some(value)) => {
                    crate::debug_log!("Result cache hit {}/{}", group, cache_key);
                    return value_to_rows(value)
                        .into_iter()
                        .map(|row| self.normalize_row(row))
                        .collect();
                }
                Ok(None) => {}
                Err(e) => self.report("result cache read", &e.into()),
            }
        }

        crate::trace_log!("{}: {}", self.model_name(), query.text);
        let rows: Vec<Row> = match self.backend.read(&query.text, &query.parameters).await {
            Ok(rows) => rows.into_iter().map(|row| self.normalize_row(row)).collect(),
            Err(e) => {
                self.report("read", &e);
                return Vec::new();
            }
        };

        if self.use_cache && !rows.is_empty() {
            if let Err(e) = self
                .context
                .cache()
                .set(&group, &cache_key, &rows_to_value(&rows))
                .await
            {
                self.report("result cache write", &e.into());
            }
        }

        rows
    }
}
