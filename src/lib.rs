//! splitsync - shared-expense sync backend
//!
//! Clients record every change to users, spending groups and spendings as an
//! immutable *operation*. The server stores operations, works out which users
//! must see each one, and lets every device of those users pull what it has
//! not yet confirmed.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types: operations, payloads, tracked entities, events, errors
//! - **`backend`** - Axum server, sync engine, repositories
//!
//! # Usage
//!
//! ```rust,no_run
//! use splitsync::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let app = create_app(config).await?;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", 3000)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
