//! Real-time Update Module
//!
//! Wake-up signals for connected devices. When a push lands, every watcher
//! of the pushed operations gets an `operations_available` event on their
//! other devices and pulls.
//!
//! # Architecture
//!
//! - **`broadcast`** - `RealtimeNotifier` trait and the broadcast-channel implementation
//! - **`subscription`** - Server-Sent Events handler for `GET /api/realtime`
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── broadcast.rs    - Addressed events and the notifier
//! └── subscription.rs - SSE subscription handler
//! ```
//!
//! # Addressing
//!
//! All subscribers share one `tokio::sync::broadcast` channel. Each event is
//! addressed to one user and may exclude some of that user's devices (the
//! device that pushed already has the data). Subscribers drop everything not
//! addressed to them.

/// Addressed events and the broadcast notifier
pub mod broadcast;

/// Server-Sent Events subscription handler
pub mod subscription;

// Re-export commonly used types and functions
pub use broadcast::{
    AddressedEvent, BroadcastNotifier, RealtimeEventBroadcast, RealtimeNotifier, broadcast_event,
};
pub use subscription::handle_realtime_subscription;
