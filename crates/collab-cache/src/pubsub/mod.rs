//! Redis Pub/Sub bridge for room events.
//!
//! The API publishes [`RoomEvent`](collab_core::RoomEvent)s after a membership
//! row or a room is deleted; every gateway instance subscribes and pushes
//! them to its sockets.

mod publisher;
mod subscriber;

pub use publisher::RedisRoomEventPublisher;
pub use subscriber::{RoomEventSubscriber, SubscriberConfig};

/// Channel carrying JSON-encoded room events
pub const ROOM_EVENTS_CHANNEL: &str = "collab:room-events";
