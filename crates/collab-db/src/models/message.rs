//! Message database model

use chrono::{DateTime, Utc};
use collab_core::Attachment;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for the chat_messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: i64,
    pub room_id: i64,
    pub author_id: i64,
    pub content: String,
    pub attachments: Json<Vec<Attachment>>,
    pub created_at: DateTime<Utc>,
}
