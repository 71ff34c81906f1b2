//! # collab-gateway
//!
//! WebSocket gateway hosting the realtime chat hub.
//!
//! ## Protocol
//!
//! Clients connect to `/ws?token=<access token>&roomId=<room>` (or send the
//! token as a bearer header on the upgrade request). Every frame is JSON text:
//!
//! ```json
//! {"event": "send_message", "data": {"roomId": 1, "content": "hi", "clientTempId": "t1"}, "ack": 7}
//! ```
//!
//! Client events: `join_chat`, `leave_chat`, `send_message`.
//! Server events: `ack`, `chat:message`, `chat:member_removed`,
//! `chat:deleted`, `chat:error`.
//!
//! ## Close codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 4000 | Unknown error |
//! | 4002 | Decode error |
//! | 4004 | Authentication failed |
//! | 4008 | Rate limited / slow consumer |

pub mod connection;
pub mod events;
pub mod handlers;
pub mod hub;
pub mod protocol;
pub mod server;

pub use connection::{ChatConnection, ConnectionRegistry, OUTBOUND_QUEUE_CAPACITY};
pub use hub::{forward_room_events, Hub};
pub use protocol::{ClientFrame, CloseCode, ServerFrame};
pub use server::{create_app, create_gateway_state, create_router, run, run_server, GatewayState};
