//! Gateway protocol definitions
//!
//! Frame format and close codes for the chat socket.

mod close_codes;
mod messages;

pub use close_codes::CloseCode;
pub use messages::{ClientFrame, ServerFrame};
