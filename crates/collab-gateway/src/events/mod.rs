//! Gateway events
//!
//! Event names and payload types for the chat socket.

mod event_types;
mod payloads;

pub use event_types::{ClientEvent, ServerEvent};
pub use payloads::{
    AckPayload, AckStatus, ChatErrorPayload, ChatMessagePayload, MemberRemovedPayload,
    RoomPayload, SendMessagePayload,
};
