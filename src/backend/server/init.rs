/**
 * Server Initialization
 *
 * 1. Build the repositories named by `storage` (connecting and migrating
 *    Postgres when selected)
 * 2. Build the push sender named by `push_provider`
 * 3. Create the application state and realtime channel
 * 4. Create the router
 */
use axum::Router;
use thiserror::Error;

use crate::backend::notifications::build_push_sender;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{ConfigError, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::storage::{build_repositories, StoreError};

/// Startup failure
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("storage initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the application state from a validated configuration
pub async fn create_state(config: ServerConfig) -> Result<AppState, InitError> {
    config.validate()?;

    let repositories = build_repositories(&config).await?;
    let push_sender = build_push_sender(&config)?;

    tracing::info!(
        "[Server] Storage: {}, push provider: {}",
        config.storage,
        config.push_provider
    );
    Ok(AppState::new(config, repositories, push_sender))
}

/// Create and configure the Axum application
pub async fn create_app(config: ServerConfig) -> Result<Router<()>, InitError> {
    tracing::info!("[Server] Initializing splitsync backend");

    let app_state = create_state(config).await?;
    Ok(create_router(app_state))
}
