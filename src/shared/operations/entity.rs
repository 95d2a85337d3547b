/**
 * Tracked Entities
 *
 * Operations are "about" one or more domain entities. A tracked entity is the
 * (id, type) pair that the sync log indexes operations by and that users
 * subscribe to through watcher bindings.
 */
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Kind of domain entity an operation can concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    User,
    Image,
    SpendingGroup,
}

impl EntityType {
    /// Column value used by the persistent stores
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Image => "image",
            Self::SpendingGroup => "spendingGroup",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "image" => Ok(Self::Image),
            "spendingGroup" => Ok(Self::SpendingGroup),
            other => Err(SharedError::validation(
                "entity_type",
                format!("unknown entity type '{}'", other),
            )),
        }
    }
}

/// A domain entity whose timeline an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub entity_id: Uuid,
    pub entity_type: EntityType,
}

impl TrackedEntity {
    pub fn new(entity_id: Uuid, entity_type: EntityType) -> Self {
        Self {
            entity_id,
            entity_type,
        }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self::new(user_id, EntityType::User)
    }

    pub fn image(image_id: Uuid) -> Self {
        Self::new(image_id, EntityType::Image)
    }

    pub fn spending_group(group_id: Uuid) -> Self {
        Self::new(group_id, EntityType::SpendingGroup)
    }
}
