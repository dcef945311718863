//! Gateway discovery

use crate::client::{Request, Requester};
use crate::error::HttpResult;
use crate::route::Route;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

/// Session start allowance returned with `GET /gateway/bot`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionStartLimit {
    pub total: u32,
    pub remaining: u32,
    /// Milliseconds until `remaining` resets
    pub reset_after: u64,
    pub max_concurrency: u32,
}

/// Gateway URL plus sharding information for a bot
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotGateway {
    pub url: String,
    pub shards: u32,
    pub session_start_limit: SessionStartLimit,
}

/// `GET /gateway`; no authentication required
pub async fn get_gateway(http: &Requester) -> HttpResult<Value> {
    let request = Request::new(Route::new(Method::GET, "/gateway")).unauthenticated();
    http.request(request).await
}

/// `GET /gateway/bot`
pub async fn get_gateway_bot(http: &Requester) -> HttpResult<Value> {
    http.request(Route::new(Method::GET, "/gateway/bot")).await
}

/// Extract the websocket URL from a `/gateway` or `/gateway/bot` body
pub fn gateway_url(body: &Value) -> Option<&str> {
    body.get("url").and_then(Value::as_str)
}
