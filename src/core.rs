//! Core ModelHaus functionality
//!
//! This module contains the main ModelHaus struct, which wires the database
//! pool, cache store, schema source and signal manager into one shared
//! model context.

use cache_system::{CacheManager, CacheStore, MemoryCache};
use model_object::schema::DEFAULT_CONNECTION;
use model_object::{JsonFileSchemaSource, Model, ModelContext, PgBackend, StorageBackend};
use signal_system::SignalManager;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ModelHausError;
use config::{AppConfig, DatabaseConfig};

/// Main ModelHaus coordinator that owns the database pool and model context
pub struct ModelHaus {
    pool: Option<PgPool>,
    context: Arc<ModelContext>,
}

impl ModelHaus {
    /// Connect to the database and build the model context from `config`
    pub async fn new(config: AppConfig) -> Result<Self, ModelHausError> {
        let pool = Self::connect(&config.database).await?;

        let cache: Arc<dyn CacheStore> = if config.cache.enabled {
            Arc::new(CacheManager::new(config.cache.clone())?)
        } else {
            Arc::new(MemoryCache::new())
        };

        let schemas = JsonFileSchemaSource::new(&config.model.schema_dir, &config.model.schema_name);
        let backend: Arc<dyn StorageBackend> = Arc::new(PgBackend::new(pool.clone()));

        let context = ModelContext::builder(Arc::new(schemas))
            .backend(DEFAULT_CONNECTION, backend)
            .cache(cache)
            .signals(Arc::new(SignalManager::new()))
            .settings(config.model.clone())
            .build();

        tracing::info!(
            "ModelHaus connected to {}:{}/{} (cache {})",
            config.database.host,
            config.database.port,
            config.database.database,
            if config.cache.enabled { "redis" } else { "in-process" }
        );

        Ok(Self {
            pool: Some(pool),
            context,
        })
    }

    /// Wrap an already assembled context, e.g. one with custom backends
    pub fn from_context(context: Arc<ModelContext>) -> Self {
        Self {
            pool: None,
            context,
        }
    }

    async fn connect(config: &DatabaseConfig) -> Result<PgPool, ModelHausError> {
        let connection_string = config.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        Ok(pool_options.connect(&connection_string).await?)
    }

    /// Database pool, when this instance opened one
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn context(&self) -> &Arc<ModelContext> {
        &self.context
    }

    pub fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.context.signals()
    }

    /// Fresh model instance of `name`
    pub async fn model(&self, name: &str) -> Result<Model, ModelHausError> {
        Ok(self.context.model(name).await?)
    }

    /// Check every configured connection
    pub async fn health_check(&self) -> Result<(), ModelHausError> {
        for (connection, backend) in self.context.connections() {
            backend.health_check().await.map_err(|e| {
                tracing::error!("Health check of connection '{}' failed: {}", connection, e);
                e
            })?;
        }
        Ok(())
    }
}
