//! Core Vitrine functionality
//!
//! [`Vitrine`] owns the storage backend, the relation registry and the signal
//! manager, and hands out typed stores that share all three.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use store_object::{
    GenericStore, MemoryBackend, PgBackend, RelationRegistry, SharedRegistry, SoftDeleteEngine,
    StorageBackend, TableMetadata,
};
use signal_system::SignalManager;
use tracing::{info, warn};

use crate::errors::VitrineError;
use config::{AppConfig, DatabaseConfig, SignalConfig, SoftDeleteConfig};

/// Main coordinator: one backend, one relation registry, one signal manager
pub struct Vitrine {
    pool: Option<PgPool>,
    backend: Arc<dyn StorageBackend>,
    registry: SharedRegistry,
    signals: Arc<SignalManager>,
    soft_delete: SoftDeleteConfig,
}

impl std::fmt::Debug for Vitrine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vitrine")
            .field("connected", &self.pool.is_some())
            .field("backend", &self.backend)
            .field("signals", &self.signals)
            .field("soft_delete", &self.soft_delete)
            .finish()
    }
}

impl Vitrine {
    /// Connect to PostgreSQL with default signal and soft-delete settings
    pub async fn new(config: DatabaseConfig) -> Result<Self, VitrineError> {
        Self::connect(&config, SignalConfig::default(), SoftDeleteConfig::default()).await
    }

    /// Connect using every section of an [`AppConfig`]
    pub async fn from_config(config: AppConfig) -> Result<Self, VitrineError> {
        config.validate()?;
        Self::connect(&config.database, config.signal, config.soft_delete).await
    }

    async fn connect(
        config: &DatabaseConfig,
        signal: SignalConfig,
        soft_delete: SoftDeleteConfig,
    ) -> Result<Self, VitrineError> {
        let connection_string = config.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        let pool = pool_options.connect(&connection_string).await?;
        info!(host = %config.host, database = %config.database, "connected to PostgreSQL");

        Ok(Self::from_pool(pool, signal, soft_delete))
    }

    /// Use an existing PostgreSQL pool
    pub fn from_pool(pool: PgPool, signal: SignalConfig, soft_delete: SoftDeleteConfig) -> Self {
        let backend = Arc::new(PgBackend::new(pool.clone()));
        let mut vitrine = Self::with_backend(backend, signal, soft_delete);
        vitrine.pool = Some(pool);
        vitrine
    }

    /// In-process storage, for tests and embedded use
    pub fn in_memory() -> Self {
        Self::in_memory_with(SignalConfig::default(), SoftDeleteConfig::default())
    }

    pub fn in_memory_with(signal: SignalConfig, soft_delete: SoftDeleteConfig) -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()), signal, soft_delete)
    }

    pub fn with_backend(
        backend: Arc<dyn StorageBackend>,
        signal: SignalConfig,
        soft_delete: SoftDeleteConfig,
    ) -> Self {
        Self {
            pool: None,
            backend,
            registry: SharedRegistry::new(RelationRegistry::new()),
            signals: Arc::new(SignalManager::new(signal)),
            soft_delete,
        }
    }

    /// Database pool, when connected to PostgreSQL
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn engine(&self) -> SoftDeleteEngine {
        SoftDeleteEngine::new(
            Arc::clone(&self.backend),
            self.registry.clone(),
            self.soft_delete.clone(),
        )
        .with_signals(Arc::clone(&self.signals))
    }

    /// Add a model's table and relations to the registry
    ///
    /// Register every table that declares a relation to a model before
    /// deleting through it; unregistered dependents are not consulted.
    pub fn register<T: TableMetadata>(&self) -> Result<(), VitrineError> {
        self.registry.update(|registry| registry.register::<T>())?;
        info!(table = T::table_name(), relations = T::relations().len(), "table registered");
        Ok(())
    }

    pub fn is_registered<T: TableMetadata>(&self) -> Result<bool, VitrineError> {
        Ok(self.registry.snapshot()?.contains(T::table_name()))
    }

    /// Typed store for a registered model
    pub fn store<T: TableMetadata>(&self) -> Result<GenericStore<T>, VitrineError> {
        if !self.is_registered::<T>()? {
            return Err(VitrineError::SchemaNotRegistered(T::table_name().to_string()));
        }
        if let Err(error) = self.validate() {
            warn!(table = T::table_name(), %error, "relation registry is incomplete");
        }
        Ok(GenericStore::new(self.engine()))
    }

    /// Every relation must point at a registered table
    pub fn validate(&self) -> Result<(), VitrineError> {
        self.registry.snapshot()?.validate()?;
        Ok(())
    }

    /// Check database connection health; always healthy in memory
    pub async fn health_check(&self) -> Result<(), VitrineError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
        }
        Ok(())
    }
}
