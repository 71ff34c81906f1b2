//! Test helpers for integration tests
//!
//! Spawns the API and the gateway on ephemeral ports, makes HTTP requests,
//! and drives WebSocket clients.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use collab_api::{create_app, AppState};
use collab_common::CookieConfig;
use collab_gateway::GatewayState;
use futures_util::{SinkExt, StreamExt};
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::fixtures::TestBackend;

/// How long a test waits for a socket frame
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// API and gateway bound to 127.0.0.1 on ephemeral ports
pub struct TestServer {
    pub api_addr: SocketAddr,
    pub gateway_addr: SocketAddr,
    pub client: Client,
    pub backend: TestBackend,
    _handles: Vec<JoinHandle<()>>,
}

async fn serve(app: axum::Router) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok((addr, handle))
}

impl TestServer {
    /// Start both servers over a fresh backend
    pub async fn start() -> Result<Self> {
        Self::start_with(TestBackend::new()).await
    }

    pub async fn start_with(backend: TestBackend) -> Result<Self> {
        let cookie = CookieConfig {
            secure: false,
            ..CookieConfig::default()
        };
        let api_state = AppState::new(backend.service_context()?, cookie);
        let gateway_state = GatewayState::from_service_context(backend.service_context()?);

        let (api_addr, api_handle) = serve(create_app(api_state)).await?;
        let (gateway_addr, gateway_handle) =
            serve(collab_gateway::create_app(gateway_state)).await?;

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            api_addr,
            gateway_addr,
            client,
            backend,
            _handles: vec![api_handle, gateway_handle],
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.api_addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    /// Make a GET request with a bearer token and optional refresh cookie
    pub async fn get_auth(&self, path: &str, token: &str, refresh: Option<&str>) -> Result<Response> {
        let mut request = self.client.get(self.url(path)).bearer_auth(token);
        if let Some(refresh) = refresh {
            request = request.header(header::COOKIE, refresh_cookie_header(refresh));
        }
        Ok(request.send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    /// Make a bodiless POST with optional bearer token and refresh cookie
    pub async fn post_session(
        &self,
        path: &str,
        token: Option<&str>,
        refresh: Option<&str>,
    ) -> Result<Response> {
        let mut request = self.client.post(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(refresh) = refresh {
            request = request.header(header::COOKIE, refresh_cookie_header(refresh));
        }
        Ok(request.send().await?)
    }

    /// Open a socket with the token in the query string
    pub async fn connect_ws(&self, token: &str, room_id: Option<i64>) -> Result<WsClient> {
        let mut url = format!("ws://{}/ws?token={token}", self.gateway_addr);
        if let Some(room_id) = room_id {
            url.push_str(&format!("&roomId={room_id}"));
        }
        WsClient::connect(&url).await
    }

    /// Open a socket without any token
    pub async fn connect_ws_anonymous(&self) -> Result<WsClient> {
        WsClient::connect(&format!("ws://{}/ws", self.gateway_addr)).await
    }
}

fn refresh_cookie_header(token: &str) -> String {
    format!("{}={token}", CookieConfig::default().name)
}

/// `Set-Cookie` header for the refresh cookie, if the response has one
pub fn refresh_set_cookie(response: &Response) -> Option<String> {
    let prefix = format!("{}=", CookieConfig::default().name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_owned)
}

/// Refresh token value set by the response, if any
pub fn refresh_token_from(response: &Response) -> Option<String> {
    let cookie = refresh_set_cookie(response)?;
    let (pair, _) = cookie.split_once(';').unwrap_or((&cookie, ""));
    let (_, value) = pair.split_once('=')?;
    (!value.is_empty()).then(|| value.to_string())
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}

/// JSON-frame WebSocket client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url).await.context("WebSocket handshake failed")?;
        Ok(Self { stream })
    }

    /// Send `{"event", "data", "ack"}`
    pub async fn emit(&mut self, event: &str, data: Value, ack: Option<u64>) -> Result<()> {
        let mut frame = serde_json::json!({ "event": event, "data": data });
        if let Some(ack) = ack {
            frame["ack"] = ack.into();
        }
        self.stream.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Next JSON frame, skipping control frames. Fails on close or timeout.
    pub async fn next_frame(&mut self) -> Result<Value> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for a frame")?
                .context("socket ended")??;
            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(frame) => anyhow::bail!("socket closed: {frame:?}"),
                _ => {}
            }
        }
    }

    /// Next frame with the given event name, skipping others
    pub async fn next_event(&mut self, event: &str) -> Result<Value> {
        loop {
            let frame = self.next_frame().await?;
            if frame["event"] == event {
                return Ok(frame);
            }
        }
    }

    /// Wait for the server's close frame and return its code
    pub async fn close_code(&mut self) -> Result<Option<u16>> {
        loop {
            let next = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .context("timed out waiting for close")?;
            match next {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => {}
                Some(Err(e)) => anyhow::bail!("socket error before close: {e}"),
                None => return Ok(None),
            }
        }
    }

    /// Assert nothing but control frames arrives within `wait`
    pub async fn expect_silence(&mut self, wait: Duration) -> Result<()> {
        match tokio::time::timeout(wait, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => anyhow::bail!("unexpected frame: {text}"),
            Ok(other) => anyhow::bail!("unexpected socket event: {other:?}"),
        }
    }
}
