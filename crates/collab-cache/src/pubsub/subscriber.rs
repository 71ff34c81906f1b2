//! Redis Pub/Sub subscriber.
//!
//! Listens on [`ROOM_EVENTS_CHANNEL`] and forwards every decodable payload to
//! an mpsc receiver, reconnecting after any Redis error.

use std::time::Duration;

use collab_core::RoomEvent;
use futures_util::StreamExt;
use redis::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ROOM_EVENTS_CHANNEL;

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Capacity of the event queue handed to the consumer
    pub buffer: usize,
    /// Pause before reconnecting after an error
    pub reconnect_delay: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            buffer: 1024,
            reconnect_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&collab_common::RedisConfig> for SubscriberConfig {
    fn from(config: &collab_common::RedisConfig) -> Self {
        Self {
            redis_url: config.url.clone(),
            ..Self::default()
        }
    }
}

/// Background listener for room events
pub struct RoomEventSubscriber;

impl RoomEventSubscriber {
    /// Start the listener. It stops once the returned receiver is dropped.
    pub fn spawn(config: SubscriberConfig) -> (JoinHandle<()>, mpsc::Receiver<RoomEvent>) {
        let (tx, rx) = mpsc::channel(config.buffer);
        let handle = tokio::spawn(Self::listener_loop(config, tx));
        (handle, rx)
    }

    async fn listener_loop(config: SubscriberConfig, tx: mpsc::Sender<RoomEvent>) {
        loop {
            match Self::run_listener(&config, &tx).await {
                Ok(()) => {
                    tracing::info!("Room event subscriber shutting down");
                    break;
                }
                Err(_) if tx.is_closed() => break,
                Err(e) => {
                    tracing::error!(error = %e, "Room event subscriber error, reconnecting...");
                    tokio::time::sleep(config.reconnect_delay).await;
                }
            }
        }
    }

    /// Forward messages until the consumer goes away (`Ok`) or Redis fails
    async fn run_listener(
        config: &SubscriberConfig,
        tx: &mpsc::Sender<RoomEvent>,
    ) -> Result<(), redis::RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(ROOM_EVENTS_CHANNEL).await?;

        tracing::info!(channel = ROOM_EVENTS_CHANNEL, "Room event subscriber connected");

        let mut stream = pubsub.on_message();
        loop {
            tokio::select! {
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        return Err(redis::RedisError::from((
                            redis::ErrorKind::IoError,
                            "pub/sub stream ended",
                        )));
                    };
                    let payload: String = msg.get_payload().unwrap_or_default();
                    let Some(event) = decode(&payload) else {
                        continue;
                    };
                    if tx.send(event).await.is_err() {
                        return Ok(());
                    }
                }
                () = tx.closed() => return Ok(()),
            }
        }
    }
}

fn decode(payload: &str) -> Option<RoomEvent> {
    match RoomEvent::from_json(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping undecodable room event");
            None
        }
    }
}
