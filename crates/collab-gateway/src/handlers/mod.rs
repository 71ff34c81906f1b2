//! Client frame handlers
//!
//! Routes decoded client frames to the hub and turns the outcome into an
//! `ack` (or a `chat:error` push when the client sent no ack id).

mod chat;
mod error;

pub use chat::{dispatch, NOT_A_MEMBER_MESSAGE};
pub use error::{HandlerError, HandlerResult};
