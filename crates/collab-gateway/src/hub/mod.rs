//! Realtime hub
//!
//! Owns the connection registry and performs every chat operation a socket
//! can trigger, plus the pushes the CRUD layer drives (member removal and
//! room deletion), which arrive as [`RoomEvent`]s over Redis Pub/Sub.
//!
//! Membership is asked of the oracle on every join and every send. Every
//! change to a room's sockets, and each persist-then-fan-out, runs under a
//! per-room lock. Receivers therefore see a room's messages in persistence
//! order and a removed member cannot slip back in between check and insert,
//! while unrelated rooms never contend. Fan-out never waits on a socket: a
//! connection whose queue is full is closed instead.

use std::sync::Arc;

use collab_core::{AccountId, ChatMessage, NewMessage, RoomEvent, RoomId};
use collab_service::{ChatService, ServiceContext, ServiceResult};
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, instrument};

use crate::connection::{ChatConnection, ConnectionRegistry, Delivery};
use crate::events::{ChatMessagePayload, MemberRemovedPayload, RoomPayload, SendMessagePayload, ServerEvent};
use crate::handlers::HandlerResult;
use crate::protocol::ServerFrame;

/// The realtime chat hub
pub struct Hub {
    ctx: Arc<ServiceContext>,
    registry: ConnectionRegistry,
    room_locks: DashMap<RoomId, Arc<Mutex<()>>>,
}

impl Hub {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            registry: ConnectionRegistry::new(),
            room_locks: DashMap::new(),
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    fn room_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        self.room_locks.entry(room_id).or_default().clone()
    }

    /// Drop the room's lock once nobody else holds it
    fn release_room_lock(&self, room_id: RoomId) {
        self.room_locks
            .remove_if(&room_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Verify the handshake token. There is no renewal path on the socket.
    ///
    /// # Errors
    /// `AuthenticationFailed` for any rejected token, `StoreUnavailable`
    /// when revocation cannot be checked
    pub async fn authenticate(&self, token: &str) -> HandlerResult<AccountId> {
        Ok(self.ctx.token_authority().verify_access(token).await?)
    }

    /// Register an authenticated connection, auto-joining `room_id` when the
    /// account is a member of it
    pub async fn connect(
        &self,
        account_id: AccountId,
        room_id: Option<RoomId>,
        sender: mpsc::Sender<ServerFrame>,
    ) -> Arc<ChatConnection> {
        let connection = ChatConnection::new(uuid::Uuid::new_v4().to_string(), account_id, sender);
        self.registry.insert(connection.clone());

        info!(
            socket_id = %connection.socket_id(),
            account_id = %account_id,
            "Chat connection registered"
        );

        if let Some(room_id) = room_id {
            if let Err(e) = self.join(&connection, room_id).await {
                debug!(
                    socket_id = %connection.socket_id(),
                    room_id = %room_id,
                    error = %e,
                    "Handshake room not joined"
                );
            }
        }

        connection
    }

    /// Join a room after confirming membership with the oracle
    ///
    /// The check and the join happen under the room lock, so a concurrent
    /// `member_removed` either sees the join or runs after it. A connection
    /// that was deregistered in the meantime is left out of the room.
    ///
    /// # Errors
    /// `NotAMember`, or a retryable error when the oracle cannot answer
    pub async fn join(&self, connection: &ChatConnection, room_id: RoomId) -> ServiceResult<()> {
        let lock = self.room_lock(room_id);
        let result = {
            let _guard = lock.lock().await;

            let checked = ChatService::new(&self.ctx)
                .require_member(connection.account_id(), room_id)
                .await;
            if checked.is_ok() {
                self.registry.join(connection, room_id);
                if self.registry.get(connection.socket_id()).is_none() {
                    self.registry.leave(connection, room_id);
                    debug!(socket_id = %connection.socket_id(), room_id = %room_id, "Join after disconnect dropped");
                }
            }
            checked
        };
        drop(lock);
        self.release_room_lock(room_id);

        result
    }

    /// Leave a room. Returns whether the connection had joined it.
    pub fn leave(&self, connection: &ChatConnection, room_id: RoomId) -> bool {
        self.registry.leave(connection, room_id)
    }

    /// Persist a message and fan it out to the room
    ///
    /// The sender receives `chat:message` tagged with its `clientTempId`;
    /// every other connection joined to the room receives it untagged.
    ///
    /// # Errors
    /// Validation, `NotAMember` or store failures. Nothing is broadcast then.
    #[instrument(skip(self, connection, payload), fields(socket_id = %connection.socket_id(), room_id = %payload.room_id))]
    pub async fn send_message(
        &self,
        connection: &ChatConnection,
        payload: SendMessagePayload,
    ) -> ServiceResult<ChatMessage> {
        let SendMessagePayload {
            room_id,
            content,
            attachments,
            client_temp_id,
        } = payload;

        let lock = self.room_lock(room_id);
        let result = {
            let _guard = lock.lock().await;

            let message = ChatService::new(&self.ctx)
                .post_message(NewMessage::new(
                    room_id,
                    connection.account_id(),
                    content,
                    attachments,
                ))
                .await;

            message.map(|message| {
                let delivered = self.fan_out(connection, &message, &client_temp_id);
                debug!(message_id = %message.id, delivered, "Message fanned out");
                message
            })
        };
        drop(lock);
        self.release_room_lock(room_id);

        result
    }

    fn fan_out(&self, sender: &ChatConnection, message: &ChatMessage, client_temp_id: &str) -> usize {
        let event = ServerEvent::ChatMessage.as_str();

        let mut delivered = usize::from(
            sender.deliver(ServerFrame::event(
                event,
                ChatMessagePayload {
                    message,
                    client_temp_id: Some(client_temp_id),
                },
            )) == Delivery::Queued,
        );

        let frame = ServerFrame::event(
            event,
            ChatMessagePayload {
                message,
                client_temp_id: None,
            },
        );
        for connection in self.registry.room_connections(message.room_id) {
            if connection.socket_id() != sender.socket_id()
                && connection.deliver(frame.clone()) == Delivery::Queued
            {
                delivered += 1;
            }
        }

        delivered
    }

    /// Deregister a connection and its room memberships. Nothing is replayed
    /// to it afterwards.
    pub fn disconnect(&self, socket_id: &str) {
        if let Some(connection) = self.registry.remove(socket_id) {
            info!(
                socket_id = %socket_id,
                account_id = %connection.account_id(),
                "Chat connection deregistered"
            );
        }
    }

    /// Remove every connection of `account_id` from the room and tell all
    /// connections that were in it, the removed ones included.
    /// Returns the number of connections notified.
    pub async fn member_removed(&self, room_id: RoomId, account_id: AccountId) -> usize {
        let lock = self.room_lock(room_id);
        let notified = {
            let _guard = lock.lock().await;

            let connections = self.registry.room_connections(room_id);
            for connection in self.registry.account_connections(account_id) {
                self.registry.leave(&connection, room_id);
            }

            let frame = ServerFrame::event(
                ServerEvent::MemberRemoved.as_str(),
                MemberRemovedPayload {
                    room_id,
                    account_id,
                },
            );
            deliver_all(&connections, &frame)
        };
        drop(lock);
        self.release_room_lock(room_id);

        info!(room_id = %room_id, account_id = %account_id, notified, "Member removed from room");
        notified
    }

    /// Tell every connection in the room it was deleted and drop the room.
    /// Returns the number of connections notified.
    pub async fn room_deleted(&self, room_id: RoomId) -> usize {
        let lock = self.room_lock(room_id);
        let notified = {
            let _guard = lock.lock().await;

            let connections = self.registry.remove_room(room_id);
            let frame = ServerFrame::event(ServerEvent::Deleted.as_str(), RoomPayload { room_id });
            deliver_all(&connections, &frame)
        };
        drop(lock);
        self.release_room_lock(room_id);

        info!(room_id = %room_id, notified, "Room deleted");
        notified
    }

    /// Push a room event published by the API
    pub async fn apply(&self, event: RoomEvent) -> usize {
        match event {
            RoomEvent::MemberRemoved { room_id, account_id } => {
                self.member_removed(room_id, account_id).await
            }
            RoomEvent::RoomDeleted { room_id } => self.room_deleted(room_id).await,
        }
    }
}

/// Apply every event from `events` until the sender side closes
pub async fn forward_room_events(hub: Arc<Hub>, mut events: mpsc::Receiver<RoomEvent>) {
    while let Some(event) = events.recv().await {
        let notified = hub.apply(event).await;
        debug!(?event, notified, "Room event applied");
    }
    info!("Room event stream closed");
}

fn deliver_all(connections: &[Arc<ChatConnection>], frame: &ServerFrame) -> usize {
    connections
        .iter()
        .filter(|c| c.deliver(frame.clone()) == Delivery::Queued)
        .count()
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("registry", &self.registry)
            .field("room_locks", &self.room_locks.len())
            .finish_non_exhaustive()
    }
}
