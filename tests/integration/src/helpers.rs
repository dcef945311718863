//! Test helpers for integration tests
//!
//! Spawns in-process axum servers on an ephemeral port and records the
//! requests they receive.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use axum::Router;
use chat_rest::Requester;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Bot token every test requester sends
pub const TEST_TOKEN: &str = "test-token";

/// User agent every test client sends
pub const TEST_USER_AGENT: &str = "ChatClientTests/1.0";

/// Mock server instance that manages lifecycle
pub struct MockServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Serve a router on an ephemeral localhost port
    pub async fn start(app: Router) -> Result<Self> {
        Self::start_with(|_| app).await
    }

    /// Serve a router that needs to know its own address
    pub async fn start_with<F>(build: F) -> Result<Self>
    where
        F: FnOnce(SocketAddr) -> Router,
    {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let app = build(addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self { addr, handle })
    }

    /// Base URL for REST requests
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL for gateway sockets
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// A requester pointed at this server
    pub fn requester(&self) -> Requester {
        Requester::new(self.http_url(), Some(TEST_TOKEN.to_string()), TEST_USER_AGENT)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A request as the mock server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Shared log of received requests
#[derive(Debug, Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<RecordedRequest>>>);

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) {
        self.0.lock().push(RecordedRequest {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(String::from),
            headers,
            body,
            received_at: Instant::now(),
        });
    }

    pub fn entries(&self) -> Vec<RecordedRequest> {
        self.0.lock().clone()
    }

    /// Requests whose path matches exactly
    pub fn for_path(&self, path: &str) -> Vec<RecordedRequest> {
        self.0
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}
