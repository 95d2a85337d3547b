//! Backend Module
//!
//! All server-side code: the Axum HTTP server, the operation sync engine and
//! the repositories behind it.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`sync`** - Push/pull/confirm orchestration, fan-out and the operation stores
//! - **`storage`** - Store errors, units of work and the repository factory
//! - **`auth`** - Credentials, JWT sessions, signup/login handlers
//! - **`devices`** - Push-token registry
//! - **`realtime`** - Addressed wake-up events over SSE
//! - **`notifications`** - Push alert delivery
//! - **`middleware`** - Request authentication
//! - **`error`** - Backend error type and HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Config, state and initialization
//! ├── routes/         - Route configuration
//! ├── sync/           - Sync engine
//! ├── storage/        - Persistence plumbing
//! ├── auth/           - Authentication
//! ├── devices/        - Push tokens
//! ├── realtime/       - Event broadcasting
//! ├── notifications/  - Push alerts
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # State Management
//!
//! Handlers share one `AppState` holding trait-object repositories, the
//! `SyncController` and the realtime broadcast sender. Storage is selected
//! at startup (`storage = "postgres" | "memory"`); nothing above the
//! repository traits knows which one is in use.

/// Server initialization and state
pub mod server;

/// Route configuration
pub mod routes;

/// Operation sync engine
pub mod sync;

/// Persistence plumbing shared by the repositories
pub mod storage;

/// Authentication and user management
pub mod auth;

/// Device push-token registry
pub mod devices;

/// Real-time event broadcasting
pub mod realtime;

/// Push alert delivery
pub mod notifications;

/// Request processing middleware
pub mod middleware;

/// Backend-specific error types
pub mod error;
