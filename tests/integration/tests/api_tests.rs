//! API Integration Tests
//!
//! The API runs on an ephemeral port over in-memory stores; no external
//! services are needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_json, assert_status, refresh_set_cookie, refresh_token_from, LoginBody, TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Log in and return (access token, refresh token)
async fn login(server: &TestServer, body: &LoginBody<'_>) -> (String, String) {
    let response = server.post("/api/v1/auth/login", body).await.unwrap();
    let refresh = refresh_token_from(&response).expect("refresh cookie set");
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    (body["accessToken"].as_str().unwrap().to_string(), refresh)
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/health").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/health/ready").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_sets_refresh_cookie() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();

    let response = server
        .post("/api/v1/auth/login", &LoginBody::from(&account))
        .await
        .unwrap();

    let cookie = refresh_set_cookie(&response).expect("refresh cookie");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));

    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 900);
    assert!(body.get("refreshToken").is_none());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();

    let response = server
        .post(
            "/api/v1/auth/login",
            &json!({"email": account.email, "password": "wrong password"}),
        )
        .await
        .unwrap();
    assert!(refresh_set_cookie(&response).is_none());
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_login_unverified_email_is_forbidden() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account_with(false).unwrap();

    let response = server
        .post("/api/v1/auth/login", &LoginBody::from(&account))
        .await
        .unwrap();
    assert!(refresh_set_cookie(&response).is_none());
    let body: Value = assert_json(response, StatusCode::FORBIDDEN).await.unwrap();
    assert_eq!(body["error"]["code"], "EMAIL_NOT_VERIFIED");
}

#[tokio::test]
async fn test_second_login_supersedes_first_refresh() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();

    let (_, first_refresh) = login(&server, &LoginBody::from(&account)).await;
    let (_, second_refresh) = login(&server, &LoginBody::from(&account)).await;

    let response = server
        .post_session("/api/v1/auth/refresh", None, Some(&first_refresh))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server
        .post_session("/api/v1/auth/refresh", None, Some(&second_refresh))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Gatekeeper Tests
// ============================================================================

#[tokio::test]
async fn test_protected_route_requires_bearer() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/api/v1/users/@me").await.unwrap();
    let body: Value = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(body["error"]["code"], "MISSING_AUTHORIZATION");
}

#[tokio::test]
async fn test_valid_access_token() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (access, _) = login(&server, &LoginBody::from(&account)).await;

    let response = server.get_auth("/api/v1/users/@me", &access, None).await.unwrap();
    assert!(response.headers().get(ACCESS_TOKEN_HEADER).is_none());
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["id"], account.id.into_inner());
}

#[tokio::test]
async fn test_expired_access_is_silently_renewed() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (_, refresh) = login(&server, &LoginBody::from(&account)).await;
    let expired = server.backend.expired_access_token(account.id).unwrap();

    let response = server
        .get_auth("/api/v1/users/@me", &expired, Some(&refresh))
        .await
        .unwrap();
    let renewed = response
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("renewed token header");
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["id"], account.id.into_inner());

    // the renewed token works on its own
    let response = server.get_auth("/api/v1/users/@me", &renewed, None).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_expired_access_without_refresh_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let expired = server.backend.expired_access_token(account.id).unwrap();

    let response = server.get_auth("/api/v1/users/@me", &expired, None).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server
        .get_auth("/api/v1/users/@me", &expired, Some("not-a-token"))
        .await
        .unwrap();
    assert!(response.headers().get(ACCESS_TOKEN_HEADER).is_none());
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_revoked_token_is_not_renewed() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (access, refresh) = login(&server, &LoginBody::from(&account)).await;

    let response = server
        .post_session("/api/v1/auth/logout", Some(&access), Some(&refresh))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .get_auth("/api/v1/users/@me", &access, Some(&refresh))
        .await
        .unwrap();
    assert!(response.headers().get(ACCESS_TOKEN_HEADER).is_none());
    let body: Value = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(body["error"]["code"], "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .get_auth("/api/v1/users/@me", "garbage.token.value", None)
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_store_outage_is_503_not_401() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (access, _) = login(&server, &LoginBody::from(&account)).await;

    server.backend.store.set_unavailable(true);

    let response = server.get_auth("/api/v1/users/@me", &access, None).await.unwrap();
    let body: Value = assert_json(response, StatusCode::SERVICE_UNAVAILABLE).await.unwrap();
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");
    assert_eq!(body["error"]["retryable"], true);
}

// ============================================================================
// Refresh / Logout Tests
// ============================================================================

#[tokio::test]
async fn test_refresh_returns_access_token_body() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (_, refresh) = login(&server, &LoginBody::from(&account)).await;

    let response = server
        .post_session("/api/v1/auth/refresh", Some("ignored"), Some(&refresh))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    let access = body["accessToken"].as_str().unwrap();

    let response = server.get_auth("/api/v1/users/@me", access, None).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_refresh_without_cookie_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .post_session("/api/v1/auth/refresh", None, None)
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_logout_always_succeeds_and_clears_cookie() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .post_session("/api/v1/auth/logout", None, None)
        .await
        .unwrap();
    let cookie = refresh_set_cookie(&response).expect("cleared cookie");
    assert!(cookie.contains("Max-Age=0"));
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post_session("/api/v1/auth/logout", Some("garbage"), Some("garbage"))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_logout_ends_refresh_session() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (access, refresh) = login(&server, &LoginBody::from(&account)).await;

    let response = server
        .post_session("/api/v1/auth/logout", Some(&access), Some(&refresh))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post_session("/api/v1/auth/refresh", None, Some(&refresh))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_cookie_only_logout_ends_refresh_session() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (_, refresh) = login(&server, &LoginBody::from(&account)).await;

    // the client lost its in-memory access token, e.g. after a reload
    let response = server
        .post_session("/api/v1/auth/logout", None, Some(&refresh))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post_session("/api/v1/auth/refresh", None, Some(&refresh))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

// ============================================================================
// Confirmation Code Tests
// ============================================================================

#[tokio::test]
async fn test_confirmation_code_flow() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account_with(false).unwrap();

    let response = server
        .post("/api/v1/auth/confirmation-code", &json!({"email": account.email}))
        .await
        .unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();

    let code = server.backend.mailer.last_code(&account.email).unwrap();
    let response = server
        .post(
            "/api/v1/auth/confirmation-code/verify",
            &json!({"email": account.email, "code": code}),
        )
        .await
        .unwrap();
    assert!(refresh_token_from(&response).is_some());
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(body["accessToken"].is_string());
}

#[tokio::test]
async fn test_confirmation_code_is_throttled() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account_with(false).unwrap();
    let body = json!({"email": account.email});

    let response = server.post("/api/v1/auth/confirmation-code", &body).await.unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();

    let response = server.post("/api/v1/auth/confirmation-code", &body).await.unwrap();
    assert_status(response, StatusCode::TOO_MANY_REQUESTS).await.unwrap();
}

#[tokio::test]
async fn test_verification_locks_after_five_failures() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account_with(false).unwrap();

    let response = server
        .post("/api/v1/auth/confirmation-code", &json!({"email": account.email}))
        .await
        .unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();
    let code = server.backend.mailer.last_code(&account.email).unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        let response = server
            .post(
                "/api/v1/auth/confirmation-code/verify",
                &json!({"email": account.email, "code": wrong}),
            )
            .await
            .unwrap();
        assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
    }

    let response = server
        .post(
            "/api/v1/auth/confirmation-code/verify",
            &json!({"email": account.email, "code": code}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::TOO_MANY_REQUESTS).await.unwrap();
}

// ============================================================================
// History Tests
// ============================================================================

#[tokio::test]
async fn test_history_requires_membership() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    let (access, _) = login(&server, &LoginBody::from(&account)).await;

    let response = server
        .get_auth("/api/v1/chats/42/messages", &access, None)
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::FORBIDDEN).await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_A_MEMBER");
}

#[tokio::test]
async fn test_history_for_member() {
    let server = TestServer::start().await.unwrap();
    let account = server.backend.seed_account().unwrap();
    server.backend.add_member(account.id, 42);
    let (access, _) = login(&server, &LoginBody::from(&account)).await;

    let response = server
        .get_auth("/api/v1/chats/42/messages?limit=10", &access, None)
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body, json!([]));

    let response = server
        .get_auth("/api/v1/chats/42/messages?limit=0", &access, None)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}
