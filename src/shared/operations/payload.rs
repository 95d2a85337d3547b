//! Operation Payloads
//!
//! The closed set of mutations a client can append to the sync log. Each
//! operation carries exactly one payload kind.
//!
//! # Wire Format
//!
//! On the wire a payload is an object with one optional member per kind:
//!
//! ```json
//! { "createUser": { "userId": "…", "displayName": "Alice" } }
//! ```
//!
//! [`WireOperationPayload`] mirrors that object. Converting it into an
//! [`OperationPayload`] enforces that exactly one member is present, so
//! malformed batches are rejected before they reach the store.
//!
//! The canonical stored form ([`OperationPayload::data`]) is the JSON encoding
//! of the enum, which has the same single-member shape and is replayed to
//! pulling clients byte for byte.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::operations::entity::TrackedEntity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub user_id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDisplayName {
    pub user_id: Uuid,
    pub display_name: String,
}

/// Raw image upload. `data` is base64 text supplied by the client and is
/// never inspected server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImage {
    pub image_id: Uuid,
    pub content_type: String,
    pub data: String,
}

/// Merges a locally created (offline) user identity into a registered one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindUser {
    pub old_id: Uuid,
    pub new_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvatar {
    pub user_id: Uuid,
    pub image_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpendingGroup {
    pub group_id: Uuid,
    pub name: String,
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSpendingGroup {
    pub group_id: Uuid,
}

/// A single expense inside a group. `amount` is in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpending {
    pub spending_id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub amount: i64,
    pub currency: String,
    pub payer_id: Uuid,
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSpending {
    pub spending_id: Uuid,
    pub group_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmail {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmail {
    pub user_id: Uuid,
    pub email: String,
}

/// Discriminant of [`OperationPayload`], stored in the `operation_type` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationPayloadType {
    CreateUser,
    UpdateDisplayName,
    UploadImage,
    BindUser,
    UpdateAvatar,
    CreateSpendingGroup,
    DeleteSpendingGroup,
    CreateSpending,
    DeleteSpending,
    UpdateEmail,
    VerifyEmail,
}

impl OperationPayloadType {
    pub const ALL: [OperationPayloadType; 11] = [
        Self::CreateUser,
        Self::UpdateDisplayName,
        Self::UploadImage,
        Self::BindUser,
        Self::UpdateAvatar,
        Self::CreateSpendingGroup,
        Self::DeleteSpendingGroup,
        Self::CreateSpending,
        Self::DeleteSpending,
        Self::UpdateEmail,
        Self::VerifyEmail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateUser => "createUser",
            Self::UpdateDisplayName => "updateDisplayName",
            Self::UploadImage => "uploadImage",
            Self::BindUser => "bindUser",
            Self::UpdateAvatar => "updateAvatar",
            Self::CreateSpendingGroup => "createSpendingGroup",
            Self::DeleteSpendingGroup => "deleteSpendingGroup",
            Self::CreateSpending => "createSpending",
            Self::DeleteSpending => "deleteSpending",
            Self::UpdateEmail => "updateEmail",
            Self::VerifyEmail => "verifyEmail",
        }
    }
}

impl fmt::Display for OperationPayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationPayloadType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                SharedError::validation("operation_type", format!("unknown operation type '{}'", s))
            })
    }
}

/// One mutation appended to the sync log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationPayload {
    CreateUser(CreateUser),
    UpdateDisplayName(UpdateDisplayName),
    UploadImage(UploadImage),
    BindUser(BindUser),
    UpdateAvatar(UpdateAvatar),
    CreateSpendingGroup(CreateSpendingGroup),
    DeleteSpendingGroup(DeleteSpendingGroup),
    CreateSpending(CreateSpending),
    DeleteSpending(DeleteSpending),
    UpdateEmail(UpdateEmail),
    VerifyEmail(VerifyEmail),
}

impl OperationPayload {
    pub fn payload_type(&self) -> OperationPayloadType {
        match self {
            Self::CreateUser(_) => OperationPayloadType::CreateUser,
            Self::UpdateDisplayName(_) => OperationPayloadType::UpdateDisplayName,
            Self::UploadImage(_) => OperationPayloadType::UploadImage,
            Self::BindUser(_) => OperationPayloadType::BindUser,
            Self::UpdateAvatar(_) => OperationPayloadType::UpdateAvatar,
            Self::CreateSpendingGroup(_) => OperationPayloadType::CreateSpendingGroup,
            Self::DeleteSpendingGroup(_) => OperationPayloadType::DeleteSpendingGroup,
            Self::CreateSpending(_) => OperationPayloadType::CreateSpending,
            Self::DeleteSpending(_) => OperationPayloadType::DeleteSpending,
            Self::UpdateEmail(_) => OperationPayloadType::UpdateEmail,
            Self::VerifyEmail(_) => OperationPayloadType::VerifyEmail,
        }
    }

    /// Canonical serialized form, stored verbatim and replayed on pull
    pub fn data(&self) -> Result<Vec<u8>, SharedError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode bytes previously produced by [`OperationPayload::data`]
    pub fn from_data(data: &[u8]) -> Result<Self, SharedError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Entities whose timelines this mutation belongs to
    pub fn tracked_entities(&self) -> Vec<TrackedEntity> {
        match self {
            Self::CreateUser(p) => vec![TrackedEntity::user(p.user_id)],
            Self::UpdateDisplayName(p) => vec![TrackedEntity::user(p.user_id)],
            Self::UploadImage(p) => vec![TrackedEntity::image(p.image_id)],
            Self::BindUser(p) => vec![TrackedEntity::user(p.old_id), TrackedEntity::user(p.new_id)],
            Self::UpdateAvatar(p) => {
                vec![TrackedEntity::user(p.user_id), TrackedEntity::image(p.image_id)]
            }
            Self::CreateSpendingGroup(p) => vec![TrackedEntity::spending_group(p.group_id)],
            Self::DeleteSpendingGroup(p) => vec![TrackedEntity::spending_group(p.group_id)],
            Self::CreateSpending(p) => vec![TrackedEntity::spending_group(p.group_id)],
            Self::DeleteSpending(p) => vec![TrackedEntity::spending_group(p.group_id)],
            Self::UpdateEmail(p) => vec![TrackedEntity::user(p.user_id)],
            Self::VerifyEmail(p) => vec![TrackedEntity::user(p.user_id)],
        }
    }

    /// Large payloads travel on their own pull channel
    pub fn is_large(&self) -> bool {
        matches!(self, Self::UploadImage(_))
    }

    /// Free text used by user search
    pub fn search_hint(&self) -> Option<&str> {
        match self {
            Self::CreateUser(p) => Some(&p.display_name),
            Self::UpdateDisplayName(p) => Some(&p.display_name),
            _ => None,
        }
    }
}

/// Payload as it arrives from clients: one optional member per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WireOperationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_user: Option<CreateUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_display_name: Option<UpdateDisplayName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_image: Option<UploadImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_user: Option<BindUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_avatar: Option<UpdateAvatar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_spending_group: Option<CreateSpendingGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_spending_group: Option<DeleteSpendingGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_spending: Option<CreateSpending>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_spending: Option<DeleteSpending>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_email: Option<UpdateEmail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_email: Option<VerifyEmail>,
}

impl TryFrom<WireOperationPayload> for OperationPayload {
    type Error = SharedError;

    fn try_from(wire: WireOperationPayload) -> Result<Self, Self::Error> {
        let WireOperationPayload {
            create_user,
            update_display_name,
            upload_image,
            bind_user,
            update_avatar,
            create_spending_group,
            delete_spending_group,
            create_spending,
            delete_spending,
            update_email,
            verify_email,
        } = wire;

        let candidates = [
            create_user.map(Self::CreateUser),
            update_display_name.map(Self::UpdateDisplayName),
            upload_image.map(Self::UploadImage),
            bind_user.map(Self::BindUser),
            update_avatar.map(Self::UpdateAvatar),
            create_spending_group.map(Self::CreateSpendingGroup),
            delete_spending_group.map(Self::DeleteSpendingGroup),
            create_spending.map(Self::CreateSpending),
            delete_spending.map(Self::DeleteSpending),
            update_email.map(Self::UpdateEmail),
            verify_email.map(Self::VerifyEmail),
        ];

        let mut populated = candidates.into_iter().flatten();
        match (populated.next(), populated.next()) {
            (Some(payload), None) => Ok(payload),
            (None, _) => Err(SharedError::bad_operation("payload is required")),
            (Some(_), Some(_)) => Err(SharedError::bad_operation("matches to multiple operations")),
        }
    }
}

impl From<OperationPayload> for WireOperationPayload {
    fn from(payload: OperationPayload) -> Self {
        let mut wire = WireOperationPayload::default();
        match payload {
            OperationPayload::CreateUser(p) => wire.create_user = Some(p),
            OperationPayload::UpdateDisplayName(p) => wire.update_display_name = Some(p),
            OperationPayload::UploadImage(p) => wire.upload_image = Some(p),
            OperationPayload::BindUser(p) => wire.bind_user = Some(p),
            OperationPayload::UpdateAvatar(p) => wire.update_avatar = Some(p),
            OperationPayload::CreateSpendingGroup(p) => wire.create_spending_group = Some(p),
            OperationPayload::DeleteSpendingGroup(p) => wire.delete_spending_group = Some(p),
            OperationPayload::CreateSpending(p) => wire.create_spending = Some(p),
            OperationPayload::DeleteSpending(p) => wire.delete_spending = Some(p),
            OperationPayload::UpdateEmail(p) => wire.update_email = Some(p),
            OperationPayload::VerifyEmail(p) => wire.verify_email = Some(p),
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::operations::entity::EntityType;
    use pretty_assertions::assert_eq;

    fn create_user(name: &str) -> CreateUser {
        CreateUser {
            user_id: Uuid::new_v4(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_wire_payload_with_single_member() {
        let inner = create_user("Alice");
        let wire = WireOperationPayload {
            create_user: Some(inner.clone()),
            ..Default::default()
        };

        let payload = OperationPayload::try_from(wire).unwrap();
        assert_eq!(payload, OperationPayload::CreateUser(inner));
        assert_eq!(payload.payload_type(), OperationPayloadType::CreateUser);
    }

    #[test]
    fn test_wire_payload_with_no_member() {
        let result = OperationPayload::try_from(WireOperationPayload::default());
        match result {
            Err(SharedError::BadOperation { message }) => assert!(message.contains("required")),
            other => panic!("Expected BadOperation, got {:?}", other),
        }
    }

    #[test]
    fn test_wire_payload_with_multiple_members() {
        let user_id = Uuid::new_v4();
        let wire = WireOperationPayload {
            create_user: Some(CreateUser {
                user_id,
                display_name: "Alice".to_string(),
            }),
            update_email: Some(UpdateEmail {
                user_id,
                email: "alice@example.com".to_string(),
            }),
            ..Default::default()
        };

        match OperationPayload::try_from(wire) {
            Err(SharedError::BadOperation { message }) => {
                assert_eq!(message, "matches to multiple operations")
            }
            other => panic!("Expected BadOperation, got {:?}", other),
        }
    }

    #[test]
    fn test_wire_payload_rejects_unknown_kind() {
        let json = r#"{"createInvoice": {"invoiceId": "x"}}"#;
        let result: Result<WireOperationPayload, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_stored_form_matches_wire_shape() {
        let payload = OperationPayload::CreateSpendingGroup(CreateSpendingGroup {
            group_id: Uuid::new_v4(),
            name: "Trip".to_string(),
            participants: vec![Uuid::new_v4()],
        });

        let stored: serde_json::Value = serde_json::from_slice(&payload.data().unwrap()).unwrap();
        let wire = serde_json::to_value(WireOperationPayload::from(payload.clone())).unwrap();
        assert_eq!(stored, wire);

        let decoded = OperationPayload::from_data(&payload.data().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_tracked_entities_per_kind() {
        let user_id = Uuid::new_v4();
        let image_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();

        let avatar = OperationPayload::UpdateAvatar(UpdateAvatar { user_id, image_id });
        assert_eq!(
            avatar.tracked_entities(),
            vec![TrackedEntity::user(user_id), TrackedEntity::image(image_id)]
        );

        let spending = OperationPayload::DeleteSpending(DeleteSpending {
            spending_id: Uuid::new_v4(),
            group_id,
        });
        assert_eq!(spending.tracked_entities(), vec![TrackedEntity::spending_group(group_id)]);

        let old_id = Uuid::new_v4();
        let bind = OperationPayload::BindUser(BindUser { old_id, new_id: user_id });
        let entities = bind.tracked_entities();
        assert_eq!(entities.len(), 2);
        assert!(entities.iter().all(|e| e.entity_type == EntityType::User));
        assert_eq!(entities[0].entity_id, old_id);
        assert_eq!(entities[1].entity_id, user_id);
    }

    #[test]
    fn test_only_image_upload_is_large() {
        let upload = OperationPayload::UploadImage(UploadImage {
            image_id: Uuid::new_v4(),
            content_type: "image/png".to_string(),
            data: "iVBORw0KGgo=".to_string(),
        });
        assert!(upload.is_large());
        assert!(!OperationPayload::CreateUser(create_user("Bob")).is_large());
    }

    #[test]
    fn test_search_hint() {
        let payload = OperationPayload::CreateUser(create_user("Alice"));
        assert_eq!(payload.search_hint(), Some("Alice"));

        let rename = OperationPayload::UpdateDisplayName(UpdateDisplayName {
            user_id: Uuid::new_v4(),
            display_name: "Alicia".to_string(),
        });
        assert_eq!(rename.search_hint(), Some("Alicia"));

        let delete = OperationPayload::DeleteSpendingGroup(DeleteSpendingGroup {
            group_id: Uuid::new_v4(),
        });
        assert_eq!(delete.search_hint(), None);
    }

    #[test]
    fn test_payload_type_names_parse() {
        for kind in OperationPayloadType::ALL {
            assert_eq!(kind.as_str().parse::<OperationPayloadType>().unwrap(), kind);
        }
        assert!("createInvoice".parse::<OperationPayloadType>().is_err());
    }
}
