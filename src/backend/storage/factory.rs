/**
 * Repository Factory
 *
 * One place maps the `storage` configuration key to concrete repositories.
 * Handlers and the sync controller only ever see the traits.
 */
use sqlx::PgPool;
use std::sync::Arc;

use crate::backend::auth::users::{MemoryUserRepository, PgUserRepository, UserRepository};
use crate::backend::devices::{DeviceRegistry, MemoryDeviceRegistry, PgDeviceRegistry};
use crate::backend::server::config::{ConfigError, ServerConfig};
use crate::backend::server::init::InitError;
use crate::backend::storage::StoreError;
use crate::backend::sync::store::{MemoryOperationStore, OperationStore, PgOperationStore};

/// Every repository the server needs, behind their traits
#[derive(Clone)]
pub struct Repositories {
    pub operations: Arc<dyn OperationStore>,
    pub users: Arc<dyn UserRepository>,
    pub devices: Arc<dyn DeviceRegistry>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            operations: Arc::new(MemoryOperationStore::new()),
            users: Arc::new(MemoryUserRepository::new()),
            devices: Arc::new(MemoryDeviceRegistry::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            operations: Arc::new(PgOperationStore::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            devices: Arc::new(PgDeviceRegistry::new(pool)),
        }
    }
}

/// Connect and migrate a Postgres pool
pub async fn connect_postgres(database_url: &str) -> Result<PgPool, StoreError> {
    tracing::info!("[Storage] Connecting to database...");
    let pool = PgPool::connect(database_url).await?;

    tracing::info!("[Storage] Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("[Storage] Database migrations completed successfully");

    Ok(pool)
}

/// Build the repositories named by `config.storage`
pub async fn build_repositories(config: &ServerConfig) -> Result<Repositories, InitError> {
    match config.storage.as_str() {
        "memory" => {
            tracing::warn!("[Storage] Using in-memory storage; data is lost on restart");
            Ok(Repositories::in_memory())
        }
        "postgres" => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| ConfigError::invalid("database_url", "required when storage = \"postgres\""))?;
            let pool = connect_postgres(url).await?;
            Ok(Repositories::postgres(pool))
        }
        other => Err(ConfigError::invalid("storage", format!("unknown backend '{}'", other)).into()),
    }
}
