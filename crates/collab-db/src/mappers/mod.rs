//! Model → entity conversions

use collab_core::{AccountCredentials, AccountId, ChatMessage, MessageId, RoomId};

use crate::models::{AccountCredentialsModel, MessageModel};

impl From<MessageModel> for ChatMessage {
    fn from(model: MessageModel) -> Self {
        Self {
            id: MessageId::new(model.id),
            room_id: RoomId::new(model.room_id),
            author_id: AccountId::new(model.author_id),
            content: model.content,
            attachments: model.attachments.0,
            created_at: model.created_at,
        }
    }
}

impl From<AccountCredentialsModel> for AccountCredentials {
    fn from(model: AccountCredentialsModel) -> Self {
        Self {
            id: AccountId::new(model.id),
            password_hash: model.password_hash,
            email_verified: model.email_verified,
        }
    }
}
