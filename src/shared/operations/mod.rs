//! Operations Module
//!
//! Wire and domain types for the operations sync log:
//!
//! - `entity` - Tracked entities (user, image, spending group)
//! - `payload` - The closed set of payload kinds and their wire form
//! - `operation` - Operations, pull channels and request/response bodies
//!
//! # Usage
//!
//! ```rust
//! use splitsync::shared::operations::{OperationPayload, TrackedEntity, WireOperation};
//! ```

pub mod entity;
pub mod payload;
pub mod operation;

// Re-export all types
pub use entity::{EntityType, TrackedEntity};
pub use payload::{
    BindUser, CreateSpending, CreateSpendingGroup, CreateUser, DeleteSpending,
    DeleteSpendingGroup, OperationPayload, OperationPayloadType, UpdateAvatar,
    UpdateDisplayName, UpdateEmail, UploadImage, VerifyEmail, WireOperationPayload,
};
pub use operation::{
    ConfirmOperationsRequest, ConfirmOperationsResponse, Operation, OperationType,
    PullOperationsResponse, PulledOperation, PushOperationsRequest, PushOperationsResponse,
    SearchUsersResponse, UserSearchResult, WireOperation,
};
