//! Chat event handlers

use collab_core::{DomainError, RoomId};
use collab_service::{ServiceError, ServiceResult};
use serde::de::DeserializeOwned;

use super::{HandlerError, HandlerResult};
use crate::connection::ChatConnection;
use crate::events::{AckPayload, ChatErrorPayload, ClientEvent, RoomPayload, SendMessagePayload, ServerEvent};
use crate::hub::Hub;
use crate::protocol::{ClientFrame, ServerFrame};

/// Reply text for a membership failure
pub const NOT_A_MEMBER_MESSAGE: &str = "not a member of this chat";

/// Handle one client frame. Only protocol violations are errors; the
/// outcome of a chat operation goes back to the client.
pub async fn dispatch(hub: &Hub, connection: &ChatConnection, frame: ClientFrame) -> HandlerResult<()> {
    let event: ClientEvent = frame
        .event
        .parse()
        .map_err(|()| HandlerError::UnknownEvent(frame.event.clone()))?;

    tracing::trace!(
        socket_id = %connection.socket_id(),
        event = %event,
        "Received frame"
    );

    match event {
        ClientEvent::JoinChat => {
            let RoomPayload { room_id } = decode(&frame)?;
            let result = hub.join(connection, room_id).await;
            respond(connection, frame.ack, room_id, None, result);
        }
        ClientEvent::LeaveChat => {
            let RoomPayload { room_id } = decode(&frame)?;
            hub.leave(connection, room_id);
            respond(connection, frame.ack, room_id, None, Ok(()));
        }
        ClientEvent::SendMessage => {
            let payload: SendMessagePayload = decode(&frame)?;
            let room_id = payload.room_id;
            let client_temp_id = payload.client_temp_id.clone();
            let result = hub.send_message(connection, payload).await.map(drop);
            respond(connection, frame.ack, room_id, Some(client_temp_id), result);
        }
    }

    Ok(())
}

fn decode<T: DeserializeOwned>(frame: &ClientFrame) -> HandlerResult<T> {
    frame
        .payload()
        .map_err(|e| HandlerError::InvalidPayload(format!("{}: {e}", frame.event)))
}

fn respond(
    connection: &ChatConnection,
    ack: Option<u64>,
    room_id: RoomId,
    client_temp_id: Option<String>,
    result: ServiceResult<()>,
) {
    let frame = match (result, ack) {
        (Ok(()), Some(ack)) => ServerFrame::reply(ack, ServerEvent::Ack.as_str(), AckPayload::success()),
        (Ok(()), None) => return,
        (Err(e), Some(ack)) => {
            ServerFrame::reply(ack, ServerEvent::Ack.as_str(), AckPayload::error(client_message(&e)))
        }
        (Err(e), None) => ServerFrame::event(
            ServerEvent::ChatError.as_str(),
            ChatErrorPayload {
                message: client_message(&e),
                room_id: Some(room_id),
                client_temp_id,
            },
        ),
    };
    connection.deliver(frame);
}

fn client_message(err: &ServiceError) -> String {
    match err {
        ServiceError::Domain(DomainError::NotAMember { .. }) => NOT_A_MEMBER_MESSAGE.to_string(),
        e if e.is_retryable() => "temporarily unavailable, try again".to_string(),
        e if e.status_code() == 400 => e.to_string(),
        e => {
            tracing::warn!(error = %e, "Chat operation failed");
            "request failed".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::tests::{open, test_hub};
    use collab_core::AccountId;
    use tokio::sync::mpsc;

    fn frame(json: &str) -> ClientFrame {
        ClientFrame::from_json(json).unwrap()
    }

    fn next(rx: &mut mpsc::Receiver<ServerFrame>) -> ServerFrame {
        rx.try_recv().unwrap()
    }

    #[tokio::test]
    async fn test_join_acks_success() {
        let t = test_hub();
        t.membership.add(AccountId::new(1), RoomId::new(5));
        let (conn, mut rx) = open(&t.hub, 1).await;

        dispatch(&t.hub, &conn, frame(r#"{"event":"join_chat","data":{"roomId":5},"ack":1}"#))
            .await
            .unwrap();

        let reply = next(&mut rx);
        assert_eq!(reply.event, "ack");
        assert_eq!(reply.ack, Some(1));
        assert_eq!(reply.data["status"], "success");
        assert!(conn.is_in_room(RoomId::new(5)));
    }

    #[tokio::test]
    async fn test_non_member_join_acks_error() {
        let t = test_hub();
        let (conn, mut rx) = open(&t.hub, 1).await;

        dispatch(&t.hub, &conn, frame(r#"{"event":"join_chat","data":{"roomId":5},"ack":2}"#))
            .await
            .unwrap();

        let reply = next(&mut rx);
        assert_eq!(reply.data["status"], "error");
        assert_eq!(reply.data["message"], NOT_A_MEMBER_MESSAGE);
        assert!(!conn.is_in_room(RoomId::new(5)));
    }

    #[tokio::test]
    async fn test_send_message_then_ack() {
        let t = test_hub();
        t.membership.add(AccountId::new(1), RoomId::new(5));
        let (conn, mut rx) = open(&t.hub, 1).await;

        dispatch(
            &t.hub,
            &conn,
            frame(r#"{"event":"send_message","data":{"roomId":5,"content":"hi","clientTempId":"c1"},"ack":3}"#),
        )
        .await
        .unwrap();

        let message = next(&mut rx);
        assert_eq!(message.event, "chat:message");
        assert_eq!(message.data["clientTempId"], "c1");

        let ack = next(&mut rx);
        assert_eq!(ack.ack, Some(3));
        assert_eq!(ack.data["status"], "success");
    }

    #[tokio::test]
    async fn test_non_member_send_without_ack_gets_chat_error() {
        let t = test_hub();
        let (conn, mut rx) = open(&t.hub, 1).await;

        dispatch(
            &t.hub,
            &conn,
            frame(r#"{"event":"send_message","data":{"roomId":5,"content":"hi","clientTempId":"c1"}}"#),
        )
        .await
        .unwrap();

        let error = next(&mut rx);
        assert_eq!(error.event, "chat:error");
        assert_eq!(error.data["message"], NOT_A_MEMBER_MESSAGE);
        assert_eq!(error.data["clientTempId"], "c1");
        assert!(t.messages.all().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_acks_error() {
        let t = test_hub();
        t.membership.add(AccountId::new(1), RoomId::new(5));
        t.messages.set_failing(true);
        let (conn, mut rx) = open(&t.hub, 1).await;

        dispatch(
            &t.hub,
            &conn,
            frame(r#"{"event":"send_message","data":{"roomId":5,"content":"hi","clientTempId":"c1"},"ack":4}"#),
        )
        .await
        .unwrap();

        let ack = next(&mut rx);
        assert_eq!(ack.event, "ack");
        assert_eq!(ack.data["status"], "error");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_leave_chat() {
        let t = test_hub();
        t.membership.add(AccountId::new(1), RoomId::new(5));
        let (conn, mut rx) = open(&t.hub, 1).await;
        t.hub.join(&conn, RoomId::new(5)).await.unwrap();

        dispatch(&t.hub, &conn, frame(r#"{"event":"leave_chat","data":{"roomId":5},"ack":5}"#))
            .await
            .unwrap();

        assert_eq!(next(&mut rx).data["status"], "success");
        assert!(!conn.is_in_room(RoomId::new(5)));
    }

    #[tokio::test]
    async fn test_protocol_violations_are_errors() {
        let t = test_hub();
        let (conn, _rx) = open(&t.hub, 1).await;

        let err = dispatch(&t.hub, &conn, frame(r#"{"event":"typing"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::UnknownEvent(_)));

        let err = dispatch(&t.hub, &conn, frame(r#"{"event":"join_chat","data":{}}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidPayload(_)));
    }
}
