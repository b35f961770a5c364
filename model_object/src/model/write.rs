use super::Model;
use crate::backend::Row;
use crate::comparator::Comparator;
use crate::entry::Entry;
use crate::errors::{ModelhausError, Result};
use crate::query_builder::{Filter, Query, Slang};
use serde_json::Value;
use signal_system::EventType;
use std::sync::Arc;
use type_mapping::is_empty_value;

impl Model {
    /// Validate and store `data`.
    ///
    /// Data carrying a non-empty primary key updates that row, anything
    /// else is inserted. Validation failures are returned together; backend
    /// failures go to the error handler and count as zero affected rows.
    pub async fn save(&mut self, data: Row) -> Result<u64> {
        if data.is_empty() {
            return Ok(0);
        }

        self.reset();
        let invalid = self.validate(&data);
        if !invalid.is_empty() {
            return Err(ModelhausError::InvalidData(invalid));
        }

        let key = data
            .get(self.primary_key())
            .filter(|v| !is_empty_value(v))
            .cloned();
        let affected = match key {
            Some(key) => self.update(key, &data).await,
            None => self.insert(&data).await,
        };

        self.reset();
        Ok(affected)
    }

    /// Store the current data of an entry of this model type
    pub async fn save_entry(&mut self, entry: &Entry) -> Result<u64> {
        self.check_entry(entry)?;
        self.save(entry.data().clone()).await
    }

    /// Delete the row with primary key `key`. Without a key, every row the
    /// pending filters match is looked up and deleted by its key.
    pub async fn delete(&mut self, key: Option<Value>) -> u64 {
        if let Some(key) = key.filter(|k| !is_empty_value(k)) {
            return self.delete_by_key(key).await;
        }

        let primary_key = self.primary_key().to_string();
        let keys: Vec<Value> = self
            .search()
            .await
            .into_iter()
            .filter_map(|mut row| row.remove(&primary_key))
            .filter(|k| !is_empty_value(k))
            .collect();

        let mut affected = 0;
        for key in keys {
            affected += self.delete_by_key(key).await;
        }
        affected
    }

    pub async fn delete_entry(&mut self, entry: &Entry) -> Result<u64> {
        self.check_entry(entry)?;
        let key = entry.primary_key_value().cloned();
        Ok(self.delete(key).await)
    }

    fn check_entry(&self, entry: &Entry) -> Result<()> {
        if entry.model_name() != self.model_name() {
            return Err(ModelhausError::ModelMismatch {
                entry: entry.model_name().to_string(),
                model: self.model_name().to_string(),
            });
        }
        Ok(())
    }

    async fn insert(&mut self, data: &Row) -> u64 {
        let query = Slang::insert(self.definition(), data);
        let affected = self.execute_write("insert", &query).await;
        if affected.is_some() {
            self.emit(EventType::Insert, None, Some(Value::Object(data.clone())));
        }
        affected.unwrap_or(0)
    }

    async fn update(&mut self, key: Value, data: &Row) -> u64 {
        let definition = Arc::clone(self.definition());
        let primary = self.primary_filter(key.clone());

        let affected = match Slang::update(&definition, &primary, data) {
            Ok(query) => self.execute_write("update", &query).await,
            Err(e) => {
                tracing::debug!("Skipping update of {}: {}", self.model_name(), e);
                None
            }
        };

        self.clear_point_cache(&key).await;
        if affected.is_some() {
            self.emit(EventType::Update, Some(&key), Some(Value::Object(data.clone())));
        }
        affected.unwrap_or(0)
    }

    async fn delete_by_key(&mut self, key: Value) -> u64 {
        self.reset();
        let definition = Arc::clone(self.definition());
        let primary = self.primary_filter(key.clone());

        let query = Slang::delete(&definition, std::slice::from_ref(&primary));
        let affected = self.execute_write("delete", &query).await;

        if self.context.settings().clear_point_cache_on_delete {
            self.clear_point_cache(&key).await;
            if let Err(e) = self.context.registry().evict_entry(&definition.registry_key(&key)) {
                self.report("entry eviction", &e);
            }
        }
        if affected.is_some() {
            self.emit(EventType::Delete, Some(&key), None);
        }

        self.reset();
        affected.unwrap_or(0)
    }

    fn primary_filter(&self, key: Value) -> Filter {
        let definition = self.definition();
        let data_type = definition
            .field_type(definition.primary_key())
            .unwrap_or(type_mapping::DataType::Text);
        Filter::create(definition.primary_key(), data_type, Comparator::Equals, key)
    }

    async fn clear_point_cache(&self, key: &Value) {
        let definition = self.definition();
        if let Err(e) = self
            .context
            .cache()
            .clear_key(&definition.cache_group(), &definition.point_cache_key(key))
            .await
        {
            self.report("point cache clear", &e.into());
        }
    }

    async fn execute_write(&self, operation: &str, query: &Query) -> Option<u64> {
        crate::trace_log!("{}: {}", self.model_name(), query.text);
        match self.backend.write(query).await {
            Ok(affected) => Some(affected),
            Err(e) => {
                self.report(operation, &e);
                None
            }
        }
    }
}
