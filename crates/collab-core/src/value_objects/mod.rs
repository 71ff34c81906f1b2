//! Value objects - immutable types identified by their value

mod ids;

pub use ids::{AccountId, IdParseError, MessageId, RoomId};
