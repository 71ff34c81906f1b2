//! Gateway frame format
//!
//! Every socket message in either direction is a JSON text frame
//! `{"event": ..., "data": ..., "ack": ...}`. A client that wants a reply
//! sets `ack`; the server answers with an `ack` event carrying the same id.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Frame received from a client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    /// Event name, e.g. `send_message`
    pub event: String,

    /// Event payload
    #[serde(default)]
    pub data: Value,

    /// Acknowledgement id the reply must echo
    #[serde(default)]
    pub ack: Option<u64>,
}

impl ClientFrame {
    /// Parse a frame from JSON text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode the payload into an event-specific type
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// Frame sent to a client
#[derive(Debug, Clone, Serialize)]
pub struct ServerFrame {
    pub event: String,

    pub data: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl ServerFrame {
    /// Create an event frame
    #[must_use]
    pub fn event(event: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            event: event.into(),
            data: serde_json::to_value(data).unwrap_or_default(),
            ack: None,
        }
    }

    /// Reply to the client frame with acknowledgement id `ack`
    #[must_use]
    pub fn reply(ack: u64, event: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            ack: Some(ack),
            ..Self::event(event, data)
        }
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
