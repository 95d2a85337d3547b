//! Authentication Module
//!
//! User accounts, sessions and the HTTP handlers for them.
//!
//! # Architecture
//!
//! - **`users`** - Credentials repository (Postgres and in-memory)
//! - **`sessions`** - JWT token generation and validation
//! - **`handlers`** - HTTP handlers for authentication endpoints
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and repositories
//! ├── sessions.rs     - JWT token management
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Signup**: credentials stored, `CreateUser` appended to the log, token returned
//! 2. **Login**: credentials verified, token for the given device returned
//! 3. **Get Me**: token verified by the middleware, user info returned
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens are per device and expire after `token_ttl_days`
//! - Invalid credentials return 401 (no information leakage)

/// User data model and repositories
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// HTTP handlers for authentication endpoints
pub mod handlers;

// Re-export commonly used types and handlers
pub use handlers::types::{AuthResponse, LoginRequest, SignupRequest, UserResponse};
pub use handlers::{get_me, login, signup};
pub use sessions::{Claims, SessionKeys};
pub use users::{MemoryUserRepository, PgUserRepository, User, UserRepository};
