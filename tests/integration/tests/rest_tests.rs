//! REST transport integration tests
//!
//! Each test runs an in-process axum server that emits the platform's
//! rate-limit headers and drives a real `Requester` against it.
//!
//! Run with: cargo test -p integration-tests --test rest_tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::routing::{any, get};
use axum::Router;
use chat_core::Snowflake;
use chat_rest::endpoints::{channels, MessagePayload};
use chat_rest::{FileAttachment, Request, Requester, Route};
use integration_tests::{
    json_response, message_body, rate_limited, Limits, MockServer, RequestLog, TEST_TOKEN,
    TEST_USER_AGENT,
};
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

#[derive(Clone, Default)]
struct Counters {
    log: RequestLog,
    hits: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

fn channel(id: u64) -> Snowflake {
    Snowflake::new(id)
}

// ============================================================================
// Bucket serialization
// ============================================================================

/// Concurrency seen per channel and overall
#[derive(Default)]
struct PerChannel {
    log: RequestLog,
    first: Counters,
    second: Counters,
    total: AtomicUsize,
    total_max: AtomicUsize,
}

impl PerChannel {
    fn for_path(&self, path: &str) -> &Counters {
        if path.ends_with("/1") {
            &self.first
        } else {
            &self.second
        }
    }
}

async fn slow_channel(
    State(state): State<Arc<PerChannel>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.log.record(method, &uri, headers, body);
    let counters = state.for_path(uri.path());

    let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
    state.total_max.fetch_max(state.total.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(100)).await;

    counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    state.total.fetch_sub(1, Ordering::SeqCst);
    json_response(StatusCode::OK, json!({"path": uri.path()}), &Limits::default())
}

#[tokio::test]
async fn test_requests_in_one_bucket_are_serialized() {
    let state = Arc::new(PerChannel::default());
    let app = Router::new()
        .route("/channels/:channel_id", get(slow_channel))
        .with_state(state.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = Arc::new(server.requester());

    let mut tasks = Vec::new();
    for id in [1, 2, 1, 2, 1, 2] {
        let http = http.clone();
        tasks.push(tokio::spawn(async move {
            channels::get_channel(&http, channel(id)).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(state.log.len(), 6);
    assert_eq!(state.first.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(state.second.max_in_flight.load(Ordering::SeqCst), 1);
    // Different channels are different buckets and may overlap
    assert_eq!(state.total_max.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Exhausted bucket
// ============================================================================

async fn exhausted_bucket(
    State(log): State<RequestLog>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    log.record(method, &uri, headers, body);
    json_response(StatusCode::OK, message_body(1, "hi"), &Limits::exhausted(0.4))
}

#[tokio::test]
async fn test_exhausted_bucket_defers_next_request() {
    let log = RequestLog::new();
    let app = Router::new()
        .route("/channels/:channel_id/messages/:message_id", get(exhausted_bucket))
        .with_state(log.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = server.requester();

    channels::get_message(&http, channel(1), Snowflake::new(10)).await.unwrap();
    channels::get_message(&http, channel(1), Snowflake::new(11)).await.unwrap();

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    let gap = entries[1].received_at - entries[0].received_at;
    assert!(gap >= Duration::from_millis(350), "second request came after {gap:?}");
}

#[tokio::test]
async fn test_exhausted_bucket_does_not_block_other_channels() {
    let log = RequestLog::new();
    let app = Router::new()
        .route("/channels/:channel_id/messages/:message_id", get(exhausted_bucket))
        .with_state(log.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = server.requester();

    channels::get_message(&http, channel(1), Snowflake::new(10)).await.unwrap();
    channels::get_message(&http, channel(2), Snowflake::new(11)).await.unwrap();

    let entries = log.entries();
    let gap = entries[1].received_at - entries[0].received_at;
    assert!(gap < Duration::from_millis(300), "unrelated bucket waited {gap:?}");
}

// ============================================================================
// 429 handling
// ============================================================================

async fn limited_once(
    State(state): State<Counters>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.log.record(method, &uri, headers, body);
    if state.hits.fetch_add(1, Ordering::SeqCst) == 0 {
        rate_limited(0.2, false)
    } else {
        json_response(StatusCode::OK, message_body(5, "after retry"), &Limits::default())
    }
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let state = Counters::default();
    let app = Router::new()
        .route("/channels/:channel_id/messages", any(limited_once))
        .with_state(state.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = server.requester();

    let body = channels::create_message(&http, channel(1), &MessagePayload::text("hi"), Vec::new())
        .await
        .unwrap();
    assert_eq!(body["content"], "after retry");

    let entries = state.log.entries();
    assert_eq!(entries.len(), 2);
    let gap = entries[1].received_at - entries[0].received_at;
    assert!(gap >= Duration::from_millis(150), "retried after {gap:?}");
    assert_eq!(entries[0].body, entries[1].body);
}

async fn always_limited(
    State(state): State<Counters>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.log.record(method, &uri, headers, body);
    state.hits.fetch_add(1, Ordering::SeqCst);
    rate_limited(0.01, false)
}

#[tokio::test]
async fn test_gives_up_after_five_attempts() {
    let state = Counters::default();
    let app = Router::new()
        .route("/channels/:channel_id", get(always_limited))
        .with_state(state.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = server.requester();

    let body = channels::get_channel(&http, channel(1)).await.unwrap();
    assert_eq!(state.hits.load(Ordering::SeqCst), 5);
    assert_eq!(body["message"], "You are being rate limited.");
}

#[derive(Clone, Default)]
struct GlobalState {
    log: RequestLog,
    limited: Arc<AtomicUsize>,
}

async fn global_limit_route(
    State(state): State<GlobalState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.log.record(method, &uri, headers, body);
    if path.ends_with("/1") && state.limited.fetch_add(1, Ordering::SeqCst) == 0 {
        return rate_limited(0.5, true);
    }
    json_response(StatusCode::OK, json!({"path": path}), &Limits::default())
}

#[tokio::test]
async fn test_global_rate_limit_blocks_every_bucket() {
    let state = GlobalState::default();
    let app = Router::new()
        .route("/channels/:channel_id", get(global_limit_route))
        .with_state(state.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = Arc::new(server.requester());

    let limited = {
        let http = http.clone();
        tokio::spawn(async move { channels::get_channel(&http, channel(1)).await })
    };

    // Wait until the 429 has closed the gate
    tokio::time::timeout(Duration::from_secs(5), async {
        while http.rate_limiter().global().is_open() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    channels::get_channel(&http, channel(2)).await.unwrap();
    limited.await.unwrap().unwrap();
    assert!(http.rate_limiter().global().is_open());

    let first = &state.log.for_path("/channels/1")[0];
    let other = &state.log.for_path("/channels/2")[0];
    let gap = other.received_at - first.received_at;
    assert!(gap >= Duration::from_millis(450), "other bucket ran after {gap:?}");
    assert_eq!(state.log.for_path("/channels/1").len(), 2);
}

async fn bucket_limit_route(
    State(state): State<GlobalState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.log.record(method, &uri, headers, body);
    if path.ends_with("/1") && state.limited.fetch_add(1, Ordering::SeqCst) == 0 {
        return rate_limited(0.5, false);
    }
    json_response(StatusCode::OK, json!({"path": path}), &Limits::default())
}

#[tokio::test]
async fn test_bucket_rate_limit_does_not_block_other_buckets() {
    let state = GlobalState::default();
    let app = Router::new()
        .route("/channels/:channel_id", get(bucket_limit_route))
        .with_state(state.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = Arc::new(server.requester());

    let limited = {
        let http = http.clone();
        tokio::spawn(async move { channels::get_channel(&http, channel(1)).await })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        while state.log.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    channels::get_channel(&http, channel(2)).await.unwrap();

    let mut gate_closed = false;
    while !limited.is_finished() {
        gate_closed |= !http.rate_limiter().global().is_open();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    limited.await.unwrap().unwrap();
    assert!(!gate_closed);

    let first = &state.log.for_path("/channels/1")[0];
    let other = &state.log.for_path("/channels/2")[0];
    let gap = other.received_at - first.received_at;
    assert!(gap < Duration::from_millis(300), "other bucket waited {gap:?}");

    let retries = state.log.for_path("/channels/1");
    assert_eq!(retries.len(), 2);
    assert!(retries[1].received_at - retries[0].received_at >= Duration::from_millis(450));
}

// ============================================================================
// Responses
// ============================================================================

#[tokio::test]
async fn test_error_status_is_returned_as_body() {
    let app = Router::new().route(
        "/channels/:channel_id",
        get(|| async {
            json_response(
                StatusCode::NOT_FOUND,
                json!({"code": 10003, "message": "Unknown Channel"}),
                &Limits::default(),
            )
        }),
    );
    let server = MockServer::start(app).await.unwrap();

    let body = channels::get_channel(&server.requester(), channel(9)).await.unwrap();
    assert_eq!(body["code"], 10003);
}

#[tokio::test]
async fn test_empty_response_is_null() {
    let app = Router::new().route(
        "/channels/:channel_id/messages/:message_id",
        any(|| async { StatusCode::NO_CONTENT }),
    );
    let server = MockServer::start(app).await.unwrap();

    let body = channels::delete_message(&server.requester(), channel(1), Snowflake::new(2), None)
        .await
        .unwrap();
    assert_eq!(body, Value::Null);
}

async fn hashed_bucket(uri: Uri) -> Response {
    json_response(StatusCode::OK, json!({"path": uri.path()}), &Limits::bucket("abcd1234"))
}

#[tokio::test]
async fn test_bucket_hash_is_learned() {
    let app = Router::new().route("/channels/:channel_id/pins", get(hashed_bucket));
    let server = MockServer::start(app).await.unwrap();
    let http = server.requester();

    channels::get_pinned_messages(&http, channel(1)).await.unwrap();

    let route = Route::new(Method::GET, "/channels/{channel_id}/pins").param("channel_id", channel(1));
    let limiter = http.rate_limiter();
    assert_eq!(limiter.learned_bucket(&route.bucket_key()).as_deref(), Some("abcd1234"));
    assert_eq!(limiter.resolve_bucket(&route), "abcd1234");
    assert!(limiter.has_lock("abcd1234"));
    assert!(limiter.has_lock(&route.bucket_key()));

    // The old key and the hash reach the same lock
    channels::get_pinned_messages(&http, channel(2)).await.unwrap();
    let other = Route::new(Method::GET, "/channels/{channel_id}/pins").param("channel_id", channel(2));
    assert_eq!(limiter.resolve_bucket(&other), "abcd1234");
    assert_eq!(limiter.lock_count(), 3);
}

async fn hashed_slow(
    State(state): State<Counters>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.log.record(method, &uri, headers, body);
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(150)).await;

    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    json_response(StatusCode::OK, json!({"path": uri.path()}), &Limits::bucket("learned"))
}

#[tokio::test]
async fn test_request_parked_at_gate_keeps_bucket_lock_after_hash_learned() {
    let state = Counters::default();
    let app = Router::new()
        .route("/channels/:channel_id", get(hashed_slow))
        .with_state(state.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = Arc::new(server.requester());

    let spawn_get = |http: Arc<Requester>| {
        tokio::spawn(async move { channels::get_channel(&http, channel(1)).await })
    };

    let first = spawn_get(http.clone());
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.log.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    // Park a second request at the closed gate while the first one learns the hash
    assert!(http.rate_limiter().global().close());
    let parked = spawn_get(http.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;
    first.await.unwrap().unwrap();
    let route = Route::new(Method::GET, "/channels/{channel_id}").param("channel_id", channel(1));
    assert_eq!(
        http.rate_limiter().learned_bucket(&route.bucket_key()).as_deref(),
        Some("learned")
    );

    http.rate_limiter().global().reopen();
    let fresh = spawn_get(http.clone());

    parked.await.unwrap().unwrap();
    fresh.await.unwrap().unwrap();

    assert_eq!(state.log.len(), 3);
    assert_eq!(state.max_in_flight.load(Ordering::SeqCst), 1);
}

async fn shared_hash_route(
    State(log): State<RequestLog>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    log.record(method, &uri, headers, body);
    let limits = if path.ends_with("/2") {
        Limits {
            bucket: Some("shared"),
            ..Limits::exhausted(1.0)
        }
    } else {
        Limits::bucket("shared")
    };
    json_response(StatusCode::OK, json!({"path": path}), &limits)
}

#[tokio::test]
async fn test_exhausted_bucket_stays_locked_when_hash_already_known() {
    let log = RequestLog::new();
    let app = Router::new()
        .route("/channels/:channel_id", get(shared_hash_route))
        .with_state(log.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = server.requester();

    channels::get_channel(&http, channel(1)).await.unwrap();
    channels::get_channel(&http, channel(2)).await.unwrap();
    channels::get_channel(&http, channel(2)).await.unwrap();

    let second = log.for_path("/channels/2");
    assert_eq!(second.len(), 2);
    let gap = second[1].received_at - second[0].received_at;
    assert!(gap >= Duration::from_millis(900), "exhausted bucket reopened after {gap:?}");
}

// ============================================================================
// Request shape
// ============================================================================

async fn record_only(
    State(log): State<RequestLog>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    log.record(method, &uri, headers, body);
    json_response(StatusCode::OK, json!([]), &Limits::default())
}

#[tokio::test]
async fn test_headers_query_and_reason() {
    let log = RequestLog::new();
    let app = Router::new()
        .route("/channels/:channel_id/messages", any(record_only))
        .with_state(log.clone());
    let server = MockServer::start(app).await.unwrap();
    let http = server.requester();

    let route = Route::new(Method::GET, "/channels/{channel_id}/messages").param("channel_id", channel(7));
    let request = Request::new(route)
        .with_query("limit", 50)
        .with_query("before", 1234)
        .with_reason(Some("clean up"));
    http.request(request).await.unwrap();

    let recorded = &log.entries()[0];
    assert_eq!(recorded.method, Method::GET);
    assert_eq!(recorded.query.as_deref(), Some("limit=50&before=1234"));
    assert_eq!(recorded.header("authorization"), Some(format!("Bot {TEST_TOKEN}").as_str()));
    assert_eq!(recorded.header("user-agent"), Some(TEST_USER_AGENT));
    assert_eq!(recorded.header("x-audit-log-reason"), Some("clean%20up"));
}

#[tokio::test]
async fn test_json_body() {
    let log = RequestLog::new();
    let app = Router::new()
        .route("/channels/:channel_id/messages", any(record_only))
        .with_state(log.clone());
    let server = MockServer::start(app).await.unwrap();

    let message = MessagePayload::text("hello").ephemeral();
    channels::create_message(&server.requester(), channel(3), &message, Vec::new())
        .await
        .unwrap();

    let recorded = &log.entries()[0];
    assert_eq!(recorded.header("content-type"), Some("application/json"));
    let sent: Value = serde_json::from_slice(&recorded.body).unwrap();
    assert_eq!(sent["content"], "hello");
    assert_eq!(sent["flags"], 64);
}

#[tokio::test]
async fn test_multipart_upload() {
    let log = RequestLog::new();
    let app = Router::new()
        .route("/channels/:channel_id/messages", any(record_only))
        .with_state(log.clone());
    let server = MockServer::start(app).await.unwrap();

    let files = vec![FileAttachment::new("hello.txt", b"file contents".to_vec()).with_description("greeting")];
    channels::create_message(&server.requester(), channel(3), &MessagePayload::text("see file"), files)
        .await
        .unwrap();

    let recorded = &log.entries()[0];
    let content_type = recorded.header("content-type").unwrap();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");

    let body = String::from_utf8_lossy(&recorded.body);
    assert!(body.contains(r#"name="payload_json""#));
    assert!(body.contains(r#"name="files[0]"; filename="hello.txt""#));
    assert!(body.contains("file contents"));
    assert!(body.contains(r#""attachments":[{"#));
    assert!(body.contains(r#""description":"greeting""#));
}

#[tokio::test]
async fn test_multipart_rebuilt_on_retry() {
    let state = Counters::default();
    let app = Router::new()
        .route("/channels/:channel_id/messages", any(limited_once))
        .with_state(state.clone());
    let server = MockServer::start(app).await.unwrap();

    let files = vec![FileAttachment::new("a.bin", vec![1, 2, 3])];
    channels::create_message(&server.requester(), channel(4), &MessagePayload::text("x"), files)
        .await
        .unwrap();

    let entries = state.log.entries();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert!(String::from_utf8_lossy(&entry.body).contains(r#"filename="a.bin""#));
    }
}
