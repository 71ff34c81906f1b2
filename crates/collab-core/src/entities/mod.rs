//! Domain entities

mod message;
mod room_event;

pub use message::{Attachment, ChatMessage, NewMessage, MAX_CONTENT_LENGTH};
pub use room_event::RoomEvent;
