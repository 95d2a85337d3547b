//! Notifications Module
//!
//! Push-notification delivery to device tokens. Delivery is fire-and-forget
//! from the caller's point of view: failures are logged by the sync
//! controller and never fail a push of operations.
//!
//! # Providers
//!
//! - **`log`** - `LogPushSender`, writes alerts to the tracing log
//! - **`http`** - `HttpPushSender`, POSTs alerts as JSON to a gateway URL
//! - **`none`** - `NoopPushSender`, drops alerts
//!
//! The provider is picked by `push_provider` in the server configuration.

/// Push senders
pub mod push;

use thiserror::Error;

pub use push::{build_push_sender, Alert, HttpPushSender, LogPushSender, NoopPushSender, PushSender};

/// Failure of a notification side channel
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Gateway rejected or could not be reached
    #[error("push delivery failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Any other delivery failure
    #[error("notification delivery failed: {message}")]
    Delivery { message: String },
}
