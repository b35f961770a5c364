//! Shared model context
//!
//! The context carries everything models of one application session share:
//! the storage backend of each connection, the cache store, field
//! validators, the signal manager, the schema source, the error handler and
//! the registry of resolved definitions and loaded entries.

use crate::backend::StorageBackend;
use crate::entry::Entry;
use crate::errors::{ModelhausError, Result};
use crate::model::{Model, ModelDefinition};
use crate::schema::{SchemaDescriptor, SchemaSource};
use cache_system::{CacheStore, MemoryCache};
use config::ModelConfig;
use serde_json::Value;
use signal_system::{EventType, ModelEvent, SignalManager};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use type_mapping::ValidatorSet;

/// Cache group holding resolved schema descriptors
pub const SCHEMA_CACHE_GROUP: &str = "MODELCONFIG";

/// Entry shared through the registry
pub type SharedEntry = Arc<tokio::sync::Mutex<Entry>>;

/// Receives backend and cache failures that operations degrade over
pub trait ErrorHandler: Send + Sync + Debug {
    fn handle(&self, model: &str, operation: &str, error: &ModelhausError);
}

/// Logs failures through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn handle(&self, model: &str, operation: &str, error: &ModelhausError) {
        tracing::error!("{} on model '{}' failed: {}", operation, model, error);
    }
}

/// Resolved definitions and loaded entries, keyed by name
#[derive(Debug, Default)]
pub struct ModelRegistry {
    definitions: RwLock<HashMap<String, Arc<ModelDefinition>>>,
    entries: RwLock<HashMap<String, SharedEntry>>,
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> ModelhausError {
    ModelhausError::InternalServerError(format!("registry lock poisoned: {}", err))
}

impl ModelRegistry {
    pub fn definition(&self, model: &str) -> Result<Option<Arc<ModelDefinition>>> {
        let definitions = self.definitions.read().map_err(poisoned)?;
        Ok(definitions.get(model).cloned())
    }

    /// Store a definition; the first one registered under a name wins
    pub fn register_definition(&self, definition: ModelDefinition) -> Result<Arc<ModelDefinition>> {
        let mut definitions = self.definitions.write().map_err(poisoned)?;
        let shared = definitions
            .entry(definition.name().to_string())
            .or_insert_with(|| Arc::new(definition));
        Ok(Arc::clone(shared))
    }

    pub fn entry(&self, key: &str) -> Result<Option<SharedEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    /// Store an entry; an entry already registered under `key` is returned
    /// instead
    pub fn register_entry(&self, key: &str, entry: Entry) -> Result<SharedEntry> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let shared = entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(entry)));
        Ok(Arc::clone(shared))
    }

    pub fn evict_entry(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries.remove(key).is_some())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct ModelContext {
    backends: HashMap<String, Arc<dyn StorageBackend>>,
    cache: Arc<dyn CacheStore>,
    schemas: Arc<dyn SchemaSource>,
    validators: Arc<ValidatorSet>,
    signals: Option<Arc<SignalManager>>,
    error_handler: Arc<dyn ErrorHandler>,
    settings: ModelConfig,
    registry: ModelRegistry,
}

impl ModelContext {
    pub fn builder(schemas: Arc<dyn SchemaSource>) -> ModelContextBuilder {
        ModelContextBuilder::new(schemas)
    }

    /// Fresh model instance of `name`
    pub async fn model(self: &Arc<Self>, name: &str) -> Result<Model> {
        let definition = self.definition(name).await?;
        let backend = self.backend(&definition)?;
        Ok(Model::new(Arc::clone(self), definition, backend))
    }

    /// Resolve a definition: registry first, then the cache store, then the
    /// schema source. Descriptors are validated before they are stored.
    pub async fn definition(&self, name: &str) -> Result<Arc<ModelDefinition>> {
        if let Some(definition) = self.registry.definition(name)? {
            return Ok(definition);
        }

        let descriptor = match self.cached_descriptor(name).await {
            Some(descriptor) => descriptor,
            None => {
                let descriptor = self.schemas.load(name)?;
                descriptor.validate(name)?;
                self.store_descriptor(name, &descriptor).await;
                descriptor
            }
        };

        let definition = ModelDefinition::new(name, descriptor)?;
        crate::debug_log!("Registered definition of model '{}'", name);
        self.registry.register_definition(definition)
    }

    async fn cached_descriptor(&self, name: &str) -> Option<SchemaDescriptor> {
        let key = name.to_ascii_uppercase();
        match self.cache.get(SCHEMA_CACHE_GROUP, &key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable cached schema of '{}': {}", name, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.report(name, "schema cache read", &e.into());
                None
            }
        }
    }

    async fn store_descriptor(&self, name: &str, descriptor: &SchemaDescriptor) {
        let value = match serde_json::to_value(descriptor) {
            Ok(value) => value,
            Err(e) => {
                self.report(name, "schema cache write", &e.into());
                return;
            }
        };
        if let Err(e) = self
            .cache
            .set(SCHEMA_CACHE_GROUP, &name.to_ascii_uppercase(), &value)
            .await
        {
            self.report(name, "schema cache write", &e.into());
        }
    }

    fn backend(&self, definition: &ModelDefinition) -> Result<Arc<dyn StorageBackend>> {
        self.backends
            .get(definition.connection())
            .cloned()
            .ok_or_else(|| {
                ModelhausError::configuration(
                    definition.name(),
                    format!("no backend for connection '{}'", definition.connection()),
                )
            })
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn validators(&self) -> &Arc<ValidatorSet> {
        &self.validators
    }

    pub fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.signals.as_ref()
    }

    pub fn settings(&self) -> &ModelConfig {
        &self.settings
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn connections(&self) -> impl Iterator<Item = (&String, &Arc<dyn StorageBackend>)> {
        self.backends.iter()
    }

    pub(crate) fn emit(&self, event: ModelEvent) {
        if let Some(signals) = &self.signals {
            signals.emit(event);
        }
    }

    /// Hand a swallowed failure to the error handler and announce it
    pub(crate) fn report(&self, model: &str, operation: &str, error: &ModelhausError) {
        self.error_handler.handle(model, operation, error);
        self.emit(
            ModelEvent::new(EventType::QueryFailed, model)
                .with_payload("operation", Value::String(operation.to_string()))
                .with_payload("error", Value::String(error.to_string())),
        );
    }
}

pub struct ModelContextBuilder {
    backends: HashMap<String, Arc<dyn StorageBackend>>,
    cache: Option<Arc<dyn CacheStore>>,
    schemas: Arc<dyn SchemaSource>,
    validators: ValidatorSet,
    signals: Option<Arc<SignalManager>>,
    error_handler: Arc<dyn ErrorHandler>,
    settings: ModelConfig,
}

impl ModelContextBuilder {
    pub fn new(schemas: Arc<dyn SchemaSource>) -> Self {
        Self {
            backends: HashMap::new(),
            cache: None,
            schemas,
            validators: ValidatorSet::with_defaults(),
            signals: None,
            error_handler: Arc::new(TracingErrorHandler),
            settings: ModelConfig::default(),
        }
    }

    pub fn backend(mut self, connection: &str, backend: Arc<dyn StorageBackend>) -> Self {
        self.backends.insert(connection.to_string(), backend);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn validators(mut self, validators: ValidatorSet) -> Self {
        self.validators = validators;
        self
    }

    pub fn signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn settings(mut self, settings: ModelConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Without an explicit cache store an in-process one is used
    pub fn build(self) -> Arc<ModelContext> {
        Arc::new(ModelContext {
            backends: self.backends,
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(MemoryCache::new())),
            schemas: self.schemas,
            validators: Arc::new(self.validators),
            signals: self.signals,
            error_handler: self.error_handler,
            settings: self.settings,
            registry: ModelRegistry::default(),
        })
    }
}
