//! Shared test helpers for integration tests.
//!
//! Every `TestApp` runs the full router on an ephemeral port backed by
//! the in-memory store, so no database is required.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use chathub_api::{AppState, build_app};
use chathub_core::config::{AppConfig, StoreProvider};
use chathub_core::types::id::UserId;
use chathub_database::{MemoryMessageStore, MessageStore};

/// Client side of a realtime connection.
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test application context
pub struct TestApp {
    /// The Axum router for in-process REST requests
    pub router: Router,
    /// Shared state, for inspecting the realtime engine
    pub state: AppState,
    /// Concrete store, for inspecting persisted flags
    pub store: Arc<MemoryMessageStore>,
    /// Address the spawned server listens on
    pub addr: std::net::SocketAddr,
}

impl TestApp {
    /// Create a new test application and start serving it.
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.database.provider = StoreProvider::Memory;
        config.auth.jwt_secret = "integration-test-secret".to_string();
        Self::with_config(config).await
    }

    /// Create a test application with a custom configuration.
    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryMessageStore::new());
        let state = AppState::new(config, Arc::clone(&store) as Arc<dyn MessageStore>);
        let router = build_app(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local addr");
        let served = router.clone();
        tokio::spawn(async move {
            axum::serve(listener, served).await.expect("Test server failed");
        });

        Self {
            router,
            state,
            store,
            addr,
        }
    }

    /// Sign up a user and return their ID.
    pub async fn create_user(&self, username: &str, password: &str) -> UserId {
        let email = format!("{username}@example.com");
        let response = self
            .request(
                "POST",
                "/api/auth/signup",
                Some(json!({
                    "username": username,
                    "email": email,
                    "password": password,
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Signup failed: {:?}",
            response.body
        );

        self.store
            .find_user_by_email(&email)
            .await
            .expect("store lookup")
            .expect("user exists after signup")
            .id
    }

    /// Login and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(json!({
                    "email": format!("{username}@example.com"),
                    "password": password,
                })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response.body["token"]
            .as_str()
            .expect("No token in login response")
            .to_string()
    }

    /// Sign up and log in; returns the user ID and token.
    pub async fn user_with_token(&self, username: &str) -> (UserId, String) {
        let id = self.create_user(username, "password123").await;
        let token = self.login(username, "password123").await;
        (id, token)
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()));

        TestResponse { status, body }
    }

    /// WebSocket URL carrying `token` as a query parameter.
    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }

    /// Open a realtime connection and wait until it is registered.
    pub async fn connect(&self, user_id: UserId, token: &str) -> WsClient {
        let (ws, _) = connect_async(self.ws_url(token))
            .await
            .expect("WebSocket handshake failed");
        let registry = Arc::clone(&self.state.realtime.registry);
        wait_until(|| registry.is_online(user_id)).await;
        ws
    }

    /// Attempt a handshake and return the HTTP status it was refused with.
    pub async fn connect_rejected(&self, url: &str) -> StatusCode {
        use tokio_tungstenite::tungstenite::Error;

        match connect_async(url).await {
            Err(Error::Http(response)) => {
                StatusCode::from_u16(response.status().as_u16()).expect("valid status")
            }
            Err(e) => panic!("Unexpected handshake error: {e}"),
            Ok(_) => panic!("Handshake unexpectedly succeeded"),
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body, or the raw text wrapped in a JSON string
    pub body: Value,
}

/// Send one `{event, data}` frame.
pub async fn send_event(ws: &mut WsClient, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::text(frame))
        .await
        .expect("Failed to send frame");
}

/// Send a raw text frame.
pub async fn send_raw(ws: &mut WsClient, text: &str) {
    ws.send(Message::text(text.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Receive the next event frame as JSON, skipping control frames.
pub async fn recv_event(ws: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for event")
            .expect("Connection ended")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("Event is not JSON");
        }
    }
}

/// Receive the next event and assert its name; returns its `data`.
pub async fn expect_event(ws: &mut WsClient, name: &str) -> Value {
    let event = recv_event(ws).await;
    assert_eq!(event["event"], name, "unexpected event: {event}");
    event["data"].clone()
}

/// Assert no event frame arrives within `ms` milliseconds.
pub async fn expect_silence(ws: &mut WsClient, ms: u64) {
    let outcome = tokio::time::timeout(Duration::from_millis(ms), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.as_str().to_owned()),
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await;
    if let Ok(Some(text)) = outcome {
        panic!("Expected no event, got {text}");
    }
}

/// Wait until the server closes the connection.
pub async fn expect_closed(ws: &mut WsClient) {
    let closed = tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "Connection was not closed by the server");
}

/// Poll `check` until it returns true or the timeout elapses.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Condition not met before timeout"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Flush presence writes until `user_id`'s persisted history equals
/// `expected`, or fail after the timeout.
pub async fn wait_for_presence(app: &TestApp, user_id: UserId, expected: &[bool]) {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    loop {
        app.state.realtime.flags.flush().await;
        let history = app.store.presence_history(user_id).await;
        if history == expected {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Presence history {history:?} never became {expected:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
