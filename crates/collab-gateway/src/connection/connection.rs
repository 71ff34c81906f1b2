//! Individual WebSocket connection
//!
//! An authenticated socket: its account, the rooms it joined, and the
//! bounded queue feeding its writer task.

use std::collections::HashSet;
use std::sync::Arc;

use collab_core::{AccountId, RoomId};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use crate::protocol::{CloseCode, ServerFrame};

/// Outbound frames buffered per connection before it counts as a slow consumer
pub const OUTBOUND_QUEUE_CAPACITY: usize = 100;

/// Result of handing a frame to a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue was full; the connection is being closed with 4008
    Overflow,
    /// Writer task is gone
    Closed,
}

/// A single authenticated WebSocket connection
pub struct ChatConnection {
    socket_id: String,
    account_id: AccountId,
    sender: mpsc::Sender<ServerFrame>,
    rooms: Mutex<HashSet<RoomId>>,
    close_code: Mutex<Option<CloseCode>>,
    close_signal: Notify,
}

impl ChatConnection {
    pub fn new(socket_id: String, account_id: AccountId, sender: mpsc::Sender<ServerFrame>) -> Arc<Self> {
        Arc::new(Self {
            socket_id,
            account_id,
            sender,
            rooms: Mutex::new(HashSet::new()),
            close_code: Mutex::new(None),
            close_signal: Notify::new(),
        })
    }

    pub fn socket_id(&self) -> &str {
        &self.socket_id
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Rooms this connection has joined
    pub fn rooms(&self) -> Vec<RoomId> {
        self.rooms.lock().iter().copied().collect()
    }

    pub fn is_in_room(&self, room_id: RoomId) -> bool {
        self.rooms.lock().contains(&room_id)
    }

    pub(crate) fn add_room(&self, room_id: RoomId) {
        self.rooms.lock().insert(room_id);
    }

    pub(crate) fn remove_room(&self, room_id: RoomId) -> bool {
        self.rooms.lock().remove(&room_id)
    }

    /// Queue a frame without waiting. A full queue closes the connection.
    pub fn deliver(&self, frame: ServerFrame) -> Delivery {
        match self.sender.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    socket_id = %self.socket_id,
                    account_id = %self.account_id,
                    "Outbound queue full, closing slow consumer"
                );
                self.close(CloseCode::RateLimited);
                Delivery::Overflow
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Ask the writer task to close the socket with `code`. The first code wins.
    pub fn close(&self, code: CloseCode) {
        {
            let mut current = self.close_code.lock();
            if current.is_some() {
                return;
            }
            *current = Some(code);
        }
        self.close_signal.notify_one();
    }

    /// Close code requested so far, if any
    pub fn close_code(&self) -> Option<CloseCode> {
        *self.close_code.lock()
    }

    /// Resolves once [`close`](Self::close) has been called
    pub async fn closed(&self) {
        if self.close_code().is_some() {
            return;
        }
        self.close_signal.notified().await;
    }

    /// Whether the writer task has stopped or a close was requested
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed() || self.close_code().is_some()
    }
}

impl std::fmt::Debug for ChatConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConnection")
            .field("socket_id", &self.socket_id)
            .field("account_id", &self.account_id)
            .field("rooms", &self.rooms.lock().len())
            .finish_non_exhaustive()
    }
}
