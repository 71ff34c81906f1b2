//! Gateway Integration Tests
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use collab_core::AccountId;
use integration_tests::TestServer;
use serde_json::json;

const ROOM: i64 = 7;

async fn access_token(server: &TestServer, account: AccountId) -> String {
    server.backend.issue_pair(account).await.unwrap().access_token
}

#[tokio::test]
async fn test_missing_token_closes_with_4004() {
    let server = TestServer::start().await.unwrap();
    let mut ws = server.connect_ws_anonymous().await.unwrap();
    assert_eq!(ws.close_code().await.unwrap(), Some(4004));
}

#[tokio::test]
async fn test_invalid_and_expired_tokens_close_with_4004() {
    let server = TestServer::start().await.unwrap();

    let mut ws = server.connect_ws("garbage", None).await.unwrap();
    assert_eq!(ws.close_code().await.unwrap(), Some(4004));

    let expired = server
        .backend
        .expired_access_token(AccountId::new(1))
        .unwrap();
    let mut ws = server.connect_ws(&expired, None).await.unwrap();
    assert_eq!(ws.close_code().await.unwrap(), Some(4004));
}

#[tokio::test]
async fn test_refresh_token_cannot_open_socket() {
    let server = TestServer::start().await.unwrap();
    let pair = server.backend.issue_pair(AccountId::new(1)).await.unwrap();

    let mut ws = server.connect_ws(&pair.refresh_token, None).await.unwrap();
    assert_eq!(ws.close_code().await.unwrap(), Some(4004));
}

#[tokio::test]
async fn test_malformed_frame_closes_with_4002() {
    let server = TestServer::start().await.unwrap();
    let token = access_token(&server, AccountId::new(1)).await;

    let mut ws = server.connect_ws(&token, None).await.unwrap();
    ws.emit("typing", json!({}), None).await.unwrap();
    assert_eq!(ws.close_code().await.unwrap(), Some(4002));
}

#[tokio::test]
async fn test_non_member_cannot_join() {
    let server = TestServer::start().await.unwrap();
    let token = access_token(&server, AccountId::new(1)).await;
    let mut ws = server.connect_ws(&token, None).await.unwrap();

    ws.emit("join_chat", json!({"roomId": ROOM}), Some(1))
        .await
        .unwrap();
    let ack = ws.next_event("ack").await.unwrap();
    assert_eq!(ack["ack"], 1);
    assert_eq!(ack["data"]["status"], "error");
    assert_eq!(ack["data"]["message"], "not a member of this chat");
}

#[tokio::test]
async fn test_message_tagging_and_order() {
    let server = TestServer::start().await.unwrap();
    let alice = AccountId::new(1);
    let bob = AccountId::new(2);
    server.backend.add_member(alice, ROOM);
    server.backend.add_member(bob, ROOM);

    let alice_token = access_token(&server, alice).await;
    let bob_token = access_token(&server, bob).await;

    // alice joins explicitly, bob through the handshake
    let mut alice_ws = server.connect_ws(&alice_token, None).await.unwrap();
    alice_ws
        .emit("join_chat", json!({"roomId": ROOM}), Some(1))
        .await
        .unwrap();
    assert_eq!(alice_ws.next_event("ack").await.unwrap()["data"]["status"], "success");
    let mut bob_ws = server.connect_ws(&bob_token, Some(ROOM)).await.unwrap();
    // round trip so bob's registration has completed
    bob_ws
        .emit("join_chat", json!({"roomId": ROOM}), Some(1))
        .await
        .unwrap();
    assert_eq!(bob_ws.next_event("ack").await.unwrap()["data"]["status"], "success");

    for i in 0..5 {
        alice_ws
            .emit(
                "send_message",
                json!({"roomId": ROOM, "content": format!("m{i}"), "clientTempId": format!("t{i}")}),
                Some(10 + i),
            )
            .await
            .unwrap();
    }

    for i in 0..5 {
        let own = alice_ws.next_event("chat:message").await.unwrap();
        assert_eq!(own["data"]["content"], format!("m{i}"));
        assert_eq!(own["data"]["clientTempId"], format!("t{i}"));

        let ack = alice_ws.next_event("ack").await.unwrap();
        assert_eq!(ack["ack"], 10 + i);
        assert_eq!(ack["data"]["status"], "success");

        let other = bob_ws.next_event("chat:message").await.unwrap();
        assert_eq!(other["data"]["content"], format!("m{i}"));
        assert!(other["data"].get("clientTempId").is_none());
    }

    let persisted: Vec<String> = server
        .backend
        .messages
        .all()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(persisted, vec!["m0", "m1", "m2", "m3", "m4"]);
}

#[tokio::test]
async fn test_non_member_send_is_not_persisted_or_broadcast() {
    let server = TestServer::start().await.unwrap();
    let member = AccountId::new(1);
    let outsider = AccountId::new(2);
    server.backend.add_member(member, ROOM);

    let member_token = access_token(&server, member).await;
    let outsider_token = access_token(&server, outsider).await;

    let mut member_ws = server.connect_ws(&member_token, Some(ROOM)).await.unwrap();
    member_ws
        .emit("join_chat", json!({"roomId": ROOM}), Some(1))
        .await
        .unwrap();
    member_ws.next_event("ack").await.unwrap();

    let mut outsider_ws = server.connect_ws(&outsider_token, None).await.unwrap();
    outsider_ws
        .emit(
            "send_message",
            json!({"roomId": ROOM, "content": "intrusion", "clientTempId": "x"}),
            Some(2),
        )
        .await
        .unwrap();

    let ack = outsider_ws.next_event("ack").await.unwrap();
    assert_eq!(ack["data"]["status"], "error");
    assert_eq!(ack["data"]["message"], "not a member of this chat");

    member_ws
        .expect_silence(Duration::from_millis(200))
        .await
        .unwrap();
    assert!(server.backend.messages.all().is_empty());

    // the socket stays usable after the rejection
    outsider_ws
        .emit("leave_chat", json!({"roomId": ROOM}), Some(3))
        .await
        .unwrap();
    assert_eq!(outsider_ws.next_event("ack").await.unwrap()["data"]["status"], "success");
}

#[tokio::test]
async fn test_send_without_ack_reports_chat_error() {
    let server = TestServer::start().await.unwrap();
    let token = access_token(&server, AccountId::new(1)).await;
    let mut ws = server.connect_ws(&token, None).await.unwrap();

    ws.emit(
        "send_message",
        json!({"roomId": ROOM, "content": "hi", "clientTempId": "t"}),
        None,
    )
    .await
    .unwrap();

    let error = ws.next_event("chat:error").await.unwrap();
    assert_eq!(error["data"]["message"], "not a member of this chat");
    assert_eq!(error["data"]["clientTempId"], "t");
}
