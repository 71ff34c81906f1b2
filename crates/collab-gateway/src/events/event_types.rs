//! Gateway event types

use std::fmt;
use std::str::FromStr;

/// Events a client may send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    JoinChat,
    LeaveChat,
    SendMessage,
}

impl ClientEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoinChat => "join_chat",
            Self::LeaveChat => "leave_chat",
            Self::SendMessage => "send_message",
        }
    }
}

impl FromStr for ClientEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join_chat" => Ok(Self::JoinChat),
            "leave_chat" => Ok(Self::LeaveChat),
            "send_message" => Ok(Self::SendMessage),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events the server pushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEvent {
    /// Reply to a client frame that carried an ack id
    Ack,
    /// New message in a joined room
    ChatMessage,
    /// An account was removed from a room
    MemberRemoved,
    /// A room was deleted
    Deleted,
    /// Failure report for a frame without an ack id
    ChatError,
}

impl ServerEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::ChatMessage => "chat:message",
            Self::MemberRemoved => "chat:member_removed",
            Self::Deleted => "chat:deleted",
            Self::ChatError => "chat:error",
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
