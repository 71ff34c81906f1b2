//! Connection management
//!
//! Live sockets and the room membership registry.

mod connection;
mod registry;

pub use connection::{ChatConnection, Delivery, OUTBOUND_QUEUE_CAPACITY};
pub use registry::ConnectionRegistry;
