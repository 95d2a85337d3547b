/**
 * Operations
 *
 * An operation is one immutable fact in the sync log: a client-assigned id,
 * a client timestamp (display ordering only), the author and the payload.
 */
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::operations::entity::TrackedEntity;
use crate::shared::operations::payload::{OperationPayload, WireOperationPayload};

/// Operation in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub operation_id: Uuid,
    /// Client timestamp in epoch milliseconds
    pub created_at: i64,
    pub author_id: Uuid,
    pub payload: OperationPayload,
}

impl Operation {
    pub fn new(operation_id: Uuid, created_at: i64, author_id: Uuid, payload: OperationPayload) -> Self {
        Self {
            operation_id,
            created_at,
            author_id,
            payload,
        }
    }

    pub fn tracked_entities(&self) -> Vec<TrackedEntity> {
        self.payload.tracked_entities()
    }

    pub fn is_large(&self) -> bool {
        self.payload.is_large()
    }

    pub fn search_hint(&self) -> Option<&str> {
        self.payload.search_hint()
    }
}

/// Pull channel. Large payloads are segregated so they never hold up the
/// regular stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    #[default]
    Regular,
    Large,
}

impl OperationType {
    pub fn is_large(&self) -> bool {
        matches!(self, Self::Large)
    }

    pub fn for_operation(operation: &Operation) -> Self {
        if operation.is_large() {
            Self::Large
        } else {
            Self::Regular
        }
    }
}

impl FromStr for OperationType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "large" => Ok(Self::Large),
            other => Err(SharedError::validation(
                "type",
                format!("expected 'regular' or 'large', got '{}'", other),
            )),
        }
    }
}

/// Operation as pushed by a client. The author is taken from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOperation {
    pub operation_id: Uuid,
    pub created_at: i64,
    pub payload: WireOperationPayload,
}

impl WireOperation {
    /// Validate the payload and attach the author
    pub fn into_operation(self, author_id: Uuid) -> Result<Operation, SharedError> {
        let payload = OperationPayload::try_from(self.payload)?;
        Ok(Operation::new(self.operation_id, self.created_at, author_id, payload))
    }
}

impl From<Operation> for WireOperation {
    fn from(operation: Operation) -> Self {
        Self {
            operation_id: operation.operation_id,
            created_at: operation.created_at,
            payload: operation.payload.into(),
        }
    }
}

/// Operation as returned to pulling clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulledOperation {
    pub operation_id: Uuid,
    pub created_at: i64,
    pub author_id: Uuid,
    pub payload: WireOperationPayload,
}

impl From<Operation> for PulledOperation {
    fn from(operation: Operation) -> Self {
        Self {
            operation_id: operation.operation_id,
            created_at: operation.created_at,
            author_id: operation.author_id,
            payload: operation.payload.into(),
        }
    }
}

/// Request body of `POST /api/operations/push`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOperationsRequest {
    pub operations: Vec<WireOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOperationsResponse {
    pub accepted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullOperationsResponse {
    pub operations: Vec<PulledOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOperationsRequest {
    pub operation_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmOperationsResponse {
    pub confirmed: usize,
}

/// One hit of `GET /api/users/search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub user_id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsersResponse {
    pub users: Vec<UserSearchResult>,
}
