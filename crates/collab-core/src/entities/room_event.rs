//! Room membership changes announced to live connections

use serde::{Deserialize, Serialize};

use crate::value_objects::{AccountId, RoomId};

/// A change made by the CRUD layer that connected sockets must hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    #[serde(rename_all = "camelCase")]
    MemberRemoved { room_id: RoomId, account_id: AccountId },

    #[serde(rename_all = "camelCase")]
    RoomDeleted { room_id: RoomId },
}

impl RoomEvent {
    pub fn room_id(&self) -> RoomId {
        match self {
            Self::MemberRemoved { room_id, .. } | Self::RoomDeleted { room_id } => *room_id,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON payload
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
