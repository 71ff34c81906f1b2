//! Chat message entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{AccountId, MessageId, RoomId};

/// Maximum message content length in characters
pub const MAX_CONTENT_LENGTH: usize = 4000;

/// File reference attached to a message. The bytes live in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
}

impl Attachment {
    /// Check if attachment is an image
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// A persisted chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author_id: AccountId,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Get a truncated preview of the message (for logs and notifications)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}

/// A message accepted from a client, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub author_id: AccountId,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl NewMessage {
    pub fn new(
        room_id: RoomId,
        author_id: AccountId,
        content: String,
        attachments: Vec<Attachment>,
    ) -> Self {
        Self {
            room_id,
            author_id,
            content,
            attachments,
        }
    }

    /// Check content rules before the message reaches the store
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(DomainError::ContentTooLong {
                max: MAX_CONTENT_LENGTH,
            });
        }
        if self.content.trim().is_empty() && self.attachments.is_empty() {
            return Err(DomainError::ValidationError(
                "message must have content or attachments".to_string(),
            ));
        }
        Ok(())
    }

    /// Materialize the persisted form once the store has assigned an id
    pub fn into_message(self, id: MessageId, created_at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id,
            room_id: self.room_id,
            author_id: self.author_id,
            content: self.content,
            attachments: self.attachments,
            created_at,
        }
    }
}
