//! Response and frame builders
//!
//! REST responses carry the platform's rate-limit headers; gateway frames are
//! compressed the way the real gateway does with `compress=zlib-stream`.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chat_gateway::protocol::GatewayMessage;
use flate2::{Compress, Compression, FlushCompress};
use serde_json::{json, Value};

/// Rate-limit headers attached to a mock response
#[derive(Debug, Clone, Default)]
pub struct Limits {
    pub bucket: Option<&'static str>,
    pub remaining: Option<u32>,
    pub reset_after: Option<f64>,
    pub global: bool,
}

impl Limits {
    pub fn bucket(hash: &'static str) -> Self {
        Self {
            bucket: Some(hash),
            ..Self::default()
        }
    }

    pub fn exhausted(reset_after: f64) -> Self {
        Self {
            remaining: Some(0),
            reset_after: Some(reset_after),
            ..Self::default()
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut put = |name: &'static str, value: String| {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(HeaderName::from_static(name), value);
            }
        };

        if let Some(bucket) = self.bucket {
            put("x-ratelimit-bucket", bucket.to_string());
        }
        if let Some(remaining) = self.remaining {
            put("x-ratelimit-limit", "5".to_string());
            put("x-ratelimit-remaining", remaining.to_string());
        }
        if let Some(reset_after) = self.reset_after {
            put("x-ratelimit-reset-after", format!("{reset_after:.3}"));
        }
        if self.global {
            put("x-ratelimit-global", "true".to_string());
        }
        headers
    }
}

/// JSON response with rate-limit headers
pub fn json_response(status: StatusCode, body: Value, limits: &Limits) -> Response {
    (status, limits.headers(), Json(body)).into_response()
}

/// 429 response as the platform sends it
pub fn rate_limited(retry_after: f64, global: bool) -> Response {
    let limits = Limits {
        reset_after: Some(retry_after),
        global,
        ..Limits::default()
    };
    json_response(
        StatusCode::TOO_MANY_REQUESTS,
        json!({
            "message": "You are being rate limited.",
            "retry_after": retry_after,
            "global": global,
        }),
        &limits,
    )
}

/// A message object as returned by the messages endpoints
pub fn message_body(id: u64, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": "100",
        "content": content,
        "author": {"id": "1", "username": "tester"},
    })
}

/// Server side of one zlib-stream gateway connection
pub struct ZlibStream(Compress);

impl ZlibStream {
    pub fn new() -> Self {
        Self(Compress::new(Compression::default(), true))
    }

    /// Compress one frame, ending with the sync-flush marker
    pub fn compress(&mut self, message: &GatewayMessage) -> Vec<u8> {
        let text = message.to_json().unwrap_or_default();
        let mut out = Vec::with_capacity(text.len() + 64);
        let mut consumed = 0;

        loop {
            if out.len() == out.capacity() {
                out.reserve(256);
            }
            let before = self.0.total_in();
            self.0
                .compress_vec(&text.as_bytes()[consumed..], &mut out, FlushCompress::Sync)
                .unwrap_or(flate2::Status::BufError);
            consumed += (self.0.total_in() - before) as usize;

            if consumed == text.len() && out.len() < out.capacity() {
                break;
            }
        }
        out
    }
}

impl Default for ZlibStream {
    fn default() -> Self {
        Self::new()
    }
}

/// READY dispatch carrying a session id and resume URL
pub fn ready_frame(sequence: u64, session_id: &str, resume_url: &str) -> GatewayMessage {
    GatewayMessage::dispatch(
        "READY",
        sequence,
        json!({
            "v": 9,
            "user": {"id": "1", "username": "tester", "bot": true},
            "guilds": [],
            "session_id": session_id,
            "resume_gateway_url": resume_url,
        }),
    )
}
