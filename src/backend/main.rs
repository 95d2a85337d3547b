/**
 * splitsync Server Entry Point
 *
 * Loads `.env`, initializes tracing, reads the layered configuration and
 * serves the Axum app until the process is stopped.
 */
use splitsync::backend::server::{create_app, InitError, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), InitError> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    tracing::info!("[STARTUP] Server initialization started");

    let config = ServerConfig::load()?;
    let addr = config.bind_addr;
    let app = create_app(config).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[STARTUP] Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
