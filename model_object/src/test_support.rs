//! Fixtures shared by the unit tests

use crate::backend::{Row, StorageBackend};
use crate::context::ModelContext;
use crate::errors::{ModelhausError, Result};
use crate::model::Model;
use crate::query_builder::{Parameters, Query};
use crate::schema::StaticSchemaSource;
use async_trait::async_trait;
use cache_system::{CacheStore, MemoryCache};
use config::ModelConfig;
use serde_json::Value;
use signal_system::SignalManager;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn user_schema() -> &'static str {
    r#"{
        "primary": ["user_id"],
        "required": ["user_email"],
        "flag": {"active": 1, "admin": 2, "verified": 4},
        "fields": {
            "user_id": {"type": "number_natural"},
            "user_email": {"type": "text", "max": 255, "unique": true},
            "user_name": {"type": "text", "max": 64},
            "user_status": {"type": "text"},
            "user_age": {"type": "number_natural"},
            "user_settings": {"type": "structure"},
            "user_active": {"type": "boolean"},
            "user_born": {"type": "text_date"},
            "user_flag": {"type": "number_natural"},
            "user_created": {"type": "text_timestamp"},
            "user_modified": {"type": "text_timestamp"}
        }
    }"#
}

pub fn profile_schema() -> &'static str {
    r#"{
        "primary": ["user_id"],
        "fields": {
            "user_id": {"type": "number_natural"},
            "profile_city": {"type": "text"}
        }
    }"#
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

/// Backend answering reads from a queue and recording every statement
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<std::result::Result<Vec<Row>, String>>>,
    reads: Mutex<Vec<(String, Parameters)>>,
    writes: Mutex<Vec<Query>>,
    write_failure: Mutex<Option<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.responses.lock().unwrap().push_back(Ok(rows));
    }

    pub fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn fail_writes(&self, message: &str) {
        *self.write_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn reads(&self) -> Vec<(String, Parameters)> {
        self.reads.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Query> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageBackend for ScriptedBackend {
    async fn read(&self, text: &str, parameters: &Parameters) -> Result<Vec<Row>> {
        self.reads
            .lock()
            .unwrap()
            .push((text.to_string(), parameters.clone()));
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(ModelhausError::DatabaseError(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, query: &Query) -> Result<u64> {
        if let Some(message) = self.write_failure.lock().unwrap().clone() {
            return Err(ModelhausError::DatabaseError(message));
        }
        self.writes.lock().unwrap().push(query.clone());
        Ok(1)
    }
}

fn schemas() -> StaticSchemaSource {
    StaticSchemaSource::new()
        .with_json("user", user_schema())
        .and_then(|s| s.with_json("profile", profile_schema()))
        .unwrap()
}

pub fn context_with_settings(
    backend: &Arc<ScriptedBackend>,
    cache: Arc<dyn CacheStore>,
    settings: ModelConfig,
) -> Arc<ModelContext> {
    ModelContext::builder(Arc::new(schemas()))
        .backend("default", Arc::clone(backend) as Arc<dyn StorageBackend>)
        .cache(cache)
        .settings(settings)
        .build()
}

pub fn context_with(
    backend: &Arc<ScriptedBackend>,
    cache: Arc<dyn CacheStore>,
    signals: Option<Arc<SignalManager>>,
) -> Arc<ModelContext> {
    let mut builder = ModelContext::builder(Arc::new(schemas()))
        .backend("default", Arc::clone(backend) as Arc<dyn StorageBackend>)
        .cache(cache);
    if let Some(signals) = signals {
        builder = builder.signals(signals);
    }
    builder.build()
}

pub async fn model(backend: &Arc<ScriptedBackend>, name: &str) -> Model {
    context_with(backend, Arc::new(MemoryCache::new()), None)
        .model(name)
        .await
        .unwrap()
}
