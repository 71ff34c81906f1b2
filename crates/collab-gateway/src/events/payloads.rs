//! Event payloads

use collab_core::{AccountId, Attachment, ChatMessage, RoomId};
use serde::{Deserialize, Serialize};

/// `join_chat` / `leave_chat` payload, and the `chat:deleted` push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub room_id: RoomId,
}

/// `send_message` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: RoomId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Client-side correlation id, echoed only to the sender
    pub client_temp_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Error,
}

/// `ack` payload
#[derive(Debug, Clone, Serialize)]
pub struct AckPayload {
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AckPayload {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: AckStatus::Success,
            message: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Error,
            message: Some(message.into()),
        }
    }
}

/// `chat:message` payload: the persisted message, plus the sender's temp id
/// on the copy delivered to the sending connection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload<'a> {
    #[serde(flatten)]
    pub message: &'a ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_temp_id: Option<&'a str>,
}

/// `chat:member_removed` payload
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRemovedPayload {
    pub room_id: RoomId,
    pub account_id: AccountId,
}

/// `chat:error` payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_temp_id: Option<String>,
}
