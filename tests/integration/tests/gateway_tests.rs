//! Gateway integration tests
//!
//! A WebSocket route on an in-process axum server speaks the gateway protocol
//! with real zlib-stream compression; the client connects through the
//! tokio-tungstenite connector.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chat_gateway::protocol::{CloseCode, GatewayMessage, OpCode};
use chat_gateway::{ConnectionState, GatewayConfig, GatewayConnection, TungsteniteConnector};
use integration_tests::{ready_frame, MockServer, ZlibStream, TEST_TOKEN, TEST_USER_AGENT};
use serde_json::{json, Value};
use tokio::sync::mpsc;

// ============================================================================
// Mock gateway
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Script {
    /// Identify, READY, one event, then ask the client to reconnect and resume
    ReconnectAndResume,
    /// Reject the client with close code 4004 after the handshake
    RejectToken,
}

/// What one connection sent during its handshake
#[derive(Debug)]
struct Observed {
    connection: usize,
    query: HashMap<String, String>,
    user_agent: Option<String>,
    frames: Vec<GatewayMessage>,
}

#[derive(Clone)]
struct GatewayState {
    script: Script,
    connections: Arc<AtomicUsize>,
    resume_url: String,
    observed: mpsc::UnboundedSender<Observed>,
}

async fn gateway_route(
    State(state): State<GatewayState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let connection = state.connections.fetch_add(1, Ordering::SeqCst);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    ws.on_upgrade(move |socket| async move {
        let observed = Observed {
            connection,
            query,
            user_agent,
            frames: Vec::new(),
        };
        run_session(socket, state, observed).await;
    })
}

struct ServerSocket {
    socket: WebSocket,
    zlib: ZlibStream,
}

impl ServerSocket {
    async fn send(&mut self, message: &GatewayMessage) {
        let bytes = self.zlib.compress(message);
        self.socket.send(Message::Binary(bytes)).await.ok();
    }

    /// Send one message split across two binary frames
    async fn send_fragmented(&mut self, message: &GatewayMessage) {
        let bytes = self.zlib.compress(message);
        let (head, tail) = bytes.split_at(bytes.len() / 2);
        self.socket.send(Message::Binary(head.to_vec())).await.ok();
        self.socket.send(Message::Binary(tail.to_vec())).await.ok();
    }

    async fn recv(&mut self) -> Option<GatewayMessage> {
        while let Some(Ok(message)) = self.socket.recv().await {
            match message {
                Message::Text(text) => return GatewayMessage::from_json(&text).ok(),
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    }

    /// Wait for the client to go away
    async fn drain(&mut self) {
        while self.recv().await.is_some() {}
    }
}

async fn run_session(socket: WebSocket, state: GatewayState, mut observed: Observed) {
    let mut server = ServerSocket {
        socket,
        zlib: ZlibStream::new(),
    };

    server.send_fragmented(&GatewayMessage::hello(45_000)).await;
    for _ in 0..2 {
        if let Some(frame) = server.recv().await {
            observed.frames.push(frame);
        }
    }
    let connection = observed.connection;
    state.observed.send(observed).ok();

    match (state.script, connection) {
        (Script::ReconnectAndResume, 0) => {
            server.send(&ready_frame(1, "session-1", &state.resume_url)).await;
            server
                .send(&GatewayMessage::dispatch(
                    "MESSAGE_CREATE",
                    2,
                    json!({"id": "10", "channel_id": "100", "content": "hello gateway"}),
                ))
                .await;
            server
                .send(&GatewayMessage::new(OpCode::Reconnect, Value::Null))
                .await;
        }
        (Script::ReconnectAndResume, _) => {
            server
                .send(&GatewayMessage::dispatch("RESUMED", 3, Value::Null))
                .await;
        }
        (Script::RejectToken, _) => {
            server
                .socket
                .send(Message::Close(Some(CloseFrame {
                    code: 4004,
                    reason: "Authentication failed".into(),
                })))
                .await
                .ok();
        }
    }

    server.drain().await;
}

async fn start_gateway(script: Script) -> (MockServer, mpsc::UnboundedReceiver<Observed>) {
    let (observed_tx, observed_rx) = mpsc::unbounded_channel();
    let server = MockServer::start_with(move |addr| {
        let state = GatewayState {
            script,
            connections: Arc::new(AtomicUsize::new(0)),
            resume_url: format!("ws://{addr}"),
            observed: observed_tx,
        };
        Router::new().route("/", get(gateway_route)).with_state(state)
    })
    .await
    .unwrap();
    (server, observed_rx)
}

fn client(server: &MockServer) -> (GatewayConnection, mpsc::Receiver<chat_gateway::DispatchEvent>) {
    let config = GatewayConfig::new(server.ws_url(), TEST_TOKEN)
        .with_compression(true);
    let connector = Arc::new(TungsteniteConnector::new(TEST_USER_AGENT));
    GatewayConnection::new(config, connector)
}

async fn poll(connection: &mut GatewayConnection) {
    tokio::time::timeout(Duration::from_secs(5), connection.poll())
        .await
        .expect("poll timed out")
        .expect("poll failed");
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_identify_ready_and_resume_over_zlib_stream() {
    let (server, mut observed) = start_gateway(Script::ReconnectAndResume).await;
    let (mut connection, mut events) = client(&server);

    connection.connect().await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Ready);
    assert_eq!(connection.heartbeat_interval(), Some(Duration::from_millis(45_000)));

    let first = observed.recv().await.unwrap();
    assert_eq!(first.connection, 0);
    assert_eq!(first.query.get("encoding").map(String::as_str), Some("json"));
    assert_eq!(first.query.get("v").map(String::as_str), Some("9"));
    assert_eq!(first.query.get("compress").map(String::as_str), Some("zlib-stream"));
    assert_eq!(first.user_agent.as_deref(), Some(TEST_USER_AGENT));

    assert_eq!(first.frames[0].op, OpCode::Heartbeat);
    assert!(first.frames[0].d.is_null());
    let identify = first.frames[1].as_identify().unwrap();
    assert_eq!(identify.token, TEST_TOKEN);

    poll(&mut connection).await;
    assert_eq!(events.recv().await.unwrap().name, "READY");
    assert_eq!(connection.session_id(), Some("session-1"));

    poll(&mut connection).await;
    let message = events.recv().await.unwrap();
    assert_eq!(message.name, "MESSAGE_CREATE");
    assert_eq!(message.data["content"], "hello gateway");
    assert_eq!(connection.sequence(), Some(2));

    // op 7: drop the socket and resume on a fresh one
    poll(&mut connection).await;
    let second = observed.recv().await.unwrap();
    assert_eq!(second.connection, 1);
    assert_eq!(second.frames[0].op, OpCode::Heartbeat);
    assert_eq!(second.frames[0].d, json!(2));
    let resume = second.frames[1].as_resume().unwrap();
    assert_eq!(resume.session_id, "session-1");
    assert_eq!(resume.seq, Some(2));
    assert_eq!(resume.token, TEST_TOKEN);

    poll(&mut connection).await;
    let resumed = events.recv().await.unwrap();
    assert_eq!(resumed.name, "RESUMED");
    assert_eq!(resumed.sequence, Some(3));

    connection.close().await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_authentication_failure_is_not_reconnectable() {
    let (server, mut observed) = start_gateway(Script::RejectToken).await;
    let (mut connection, _events) = client(&server);

    connection.connect().await.unwrap();
    observed.recv().await.unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), connection.poll())
        .await
        .expect("poll timed out")
        .unwrap_err();
    assert_eq!(err.close_code(), Some(CloseCode::AuthenticationFailed));
    assert!(!err.can_reconnect());
    assert_eq!(connection.state(), ConnectionState::Disconnected);
}
