//! Connection registry
//!
//! Tracks every live connection and the set of sockets joined to each room,
//! using `DashMap` so rooms on different shards never contend.

use std::collections::HashSet;
use std::sync::Arc;

use collab_core::{AccountId, RoomId};
use dashmap::DashMap;

use super::ChatConnection;

/// Live connections and room membership
#[derive(Default)]
pub struct ConnectionRegistry {
    /// Active connections by socket ID
    connections: DashMap<String, Arc<ChatConnection>>,

    /// Room ID to joined socket IDs
    rooms: DashMap<RoomId, HashSet<String>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection
    pub fn insert(&self, connection: Arc<ChatConnection>) {
        tracing::debug!(socket_id = %connection.socket_id(), "Connection added");
        self.connections
            .insert(connection.socket_id().to_string(), connection);
    }

    /// Remove a connection and all of its room memberships
    pub fn remove(&self, socket_id: &str) -> Option<Arc<ChatConnection>> {
        let (_, connection) = self.connections.remove(socket_id)?;

        for room_id in connection.rooms() {
            self.detach(room_id, socket_id);
        }

        tracing::debug!(socket_id = %socket_id, "Connection removed");
        Some(connection)
    }

    pub fn get(&self, socket_id: &str) -> Option<Arc<ChatConnection>> {
        self.connections.get(socket_id).map(|r| r.clone())
    }

    /// Add a connection to a room
    pub fn join(&self, connection: &ChatConnection, room_id: RoomId) {
        connection.add_room(room_id);
        self.rooms
            .entry(room_id)
            .or_default()
            .insert(connection.socket_id().to_string());

        tracing::trace!(
            socket_id = %connection.socket_id(),
            room_id = %room_id,
            "Connection joined room"
        );
    }

    /// Remove a connection from a room. Returns whether it was joined.
    pub fn leave(&self, connection: &ChatConnection, room_id: RoomId) -> bool {
        let was_joined = connection.remove_room(room_id);
        self.detach(room_id, connection.socket_id());
        was_joined
    }

    fn detach(&self, room_id: RoomId, socket_id: &str) {
        if let Some(mut sockets) = self.rooms.get_mut(&room_id) {
            sockets.remove(socket_id);
        }
        self.rooms.remove_if(&room_id, |_, sockets| sockets.is_empty());
    }

    /// Snapshot of the connections joined to a room. The shard lock is
    /// released before the caller enqueues anything.
    pub fn room_connections(&self, room_id: RoomId) -> Vec<Arc<ChatConnection>> {
        self.rooms
            .get(&room_id)
            .map(|sockets| {
                sockets
                    .iter()
                    .filter_map(|sid| self.connections.get(sid).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop a room and detach every connection from it. Returns the
    /// connections that were joined.
    pub fn remove_room(&self, room_id: RoomId) -> Vec<Arc<ChatConnection>> {
        let Some((_, sockets)) = self.rooms.remove(&room_id) else {
            return Vec::new();
        };

        sockets
            .iter()
            .filter_map(|sid| self.connections.get(sid).map(|c| c.clone()))
            .inspect(|connection| {
                connection.remove_room(room_id);
            })
            .collect()
    }

    /// All connections authenticated as `account_id`
    pub fn account_connections(&self, account_id: AccountId) -> Vec<Arc<ChatConnection>> {
        self.connections
            .iter()
            .filter(|c| c.account_id() == account_id)
            .map(|c| c.clone())
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of rooms with at least one joined connection
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
