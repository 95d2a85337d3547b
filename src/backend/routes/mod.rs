//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//! Routes are organized by functionality into focused submodules.
//!
//! - **`router`** - Main router creation, auth layering and fallback
//! - **`api_routes`** - Account and device endpoints
//! - **`sync_routes`** - Operation push/pull/confirm, user search, realtime
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! ├── api_routes.rs   - Auth and device endpoints
//! └── sync_routes.rs  - Sync endpoints
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use splitsync::backend::routes::create_router;
//! use splitsync::backend::server::{create_state, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = create_state(ServerConfig::default()).await?;
//! let router = create_router(state);
//! # Ok(())
//! # }
//! ```

/// Main router creation
pub mod router;

/// Account and device routes
pub mod api_routes;

/// Sync engine routes
pub mod sync_routes;

pub use router::create_router;
