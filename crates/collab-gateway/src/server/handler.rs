//! WebSocket handler
//!
//! Authenticates the handshake, then runs one reader and one writer task per
//! socket. The reader is never aborted, so a send it already started still
//! completes if the socket goes away.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap},
    response::IntoResponse,
};
use collab_core::{AccountId, RoomId};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::connection::{ChatConnection, OUTBOUND_QUEUE_CAPACITY};
use crate::handlers::{dispatch, HandlerError};
use crate::protocol::{ClientFrame, CloseCode, ServerFrame};
use crate::server::GatewayState;

/// Handshake query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeParams {
    pub token: Option<String>,
    /// Room to join right away if the account is a member
    pub room_id: Option<String>,
}

/// Token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// WebSocket gateway handler
///
/// The token comes from the `token` query parameter or the bearer header,
/// never from a cookie. It is verified before the upgrade completes; a
/// rejected socket is closed with 4004 right after it opens.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(params): Query<HandshakeParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(&headers).map(str::to_owned));
    let room_id = params.room_id.and_then(|r| r.parse::<RoomId>().ok());

    let auth = match token {
        Some(token) => state.hub().authenticate(&token).await,
        None => Err(HandlerError::AuthenticationFailed("missing token".to_string())),
    };

    ws.on_upgrade(move |socket| async move {
        match auth {
            Ok(account_id) => handle_socket(state, socket, account_id, room_id).await,
            Err(e) => {
                tracing::info!(error = %e, "WebSocket handshake rejected");
                reject(socket, e.to_close_code()).await;
            }
        }
    })
}

fn close_message(code: CloseCode) -> Message {
    Message::Close(Some(CloseFrame {
        code: code.as_u16(),
        reason: code.reason().into(),
    }))
}

async fn reject(mut socket: WebSocket, code: CloseCode) {
    if socket.send(close_message(code)).await.is_err() {
        tracing::debug!("Client went away before the close frame");
    }
}

/// Handle an authenticated WebSocket connection
async fn handle_socket(
    state: GatewayState,
    socket: WebSocket,
    account_id: AccountId,
    room_id: Option<RoomId>,
) {
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(OUTBOUND_QUEUE_CAPACITY);
    let connection = state.hub().connect(account_id, room_id, tx).await;
    let socket_id = connection.socket_id().to_string();

    let (mut ws_sink, mut ws_stream) = socket.split();

    let state_recv = state.clone();
    let connection_recv = connection.clone();

    let mut recv_task = tokio::spawn(async move {
        let socket_id = connection_recv.socket_id().to_string();
        while let Some(msg) = ws_stream.next().await {
            if connection_recv.is_closed() {
                break;
            }
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(e) = handle_text_message(&state_recv, &connection_recv, &text).await {
                        tracing::debug!(
                            socket_id = %socket_id,
                            error = %e,
                            "Closing connection due to error"
                        );
                        connection_recv.close(e.to_close_code());
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(socket_id = %socket_id, "Binary messages not supported");
                    connection_recv.close(CloseCode::DecodeError);
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    tracing::info!(socket_id = %socket_id, "Client closed connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!(socket_id = %socket_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    let connection_send = connection.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = connection_send.closed() => {
                    let code = connection_send.close_code().unwrap_or(CloseCode::UnknownError);
                    let _ = ws_sink.send(close_message(code)).await;
                    break;
                }
                frame = rx.recv() => {
                    let Some(frame) = frame else {
                        let _ = ws_sink.close().await;
                        break;
                    };
                    match frame.to_json() {
                        Ok(json) => {
                            if ws_sink.send(Message::Text(json.into())).await.is_err() {
                                tracing::warn!(
                                    socket_id = %connection_send.socket_id(),
                                    "Failed to send message to WebSocket"
                                );
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Failed to encode frame"),
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {
            // A requested close still has its frame to flush
            if connection.close_code().is_none() {
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            tracing::debug!(socket_id = %socket_id, "Send task ended");
        }
    }

    state.hub().disconnect(&socket_id);
}

/// Handle a text message from the client
async fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<ChatConnection>,
    text: &str,
) -> Result<(), HandlerError> {
    let frame = ClientFrame::from_json(text).map_err(|e| HandlerError::InvalidFrame(e.to_string()))?;
    dispatch(state.hub(), connection, frame).await
}
