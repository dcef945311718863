//! The rate-limited dispatcher
//!
//! Each call resolves its bucket, waits for the global gate, then holds the
//! bucket lock for the whole retry loop. Rate-limit headers on every response
//! teach the limiter the server's bucket hash; an exhausted bucket stays locked
//! until its reset window has elapsed.

use super::request::{AuthMode, Request, RequestBody};
use crate::error::{HttpError, HttpResult};
use crate::ratelimit::{BucketGuard, RateLimitHeaders, RateLimiter};
use chat_common::ClientConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempts made for one call before the last response is returned as-is
pub const MAX_ATTEMPTS: u32 = 5;

/// Delay used when a 429 response carries no retry hint
const FALLBACK_RETRY: Duration = Duration::from_secs(1);

const AUDIT_LOG_REASON: HeaderName = HeaderName::from_static("x-audit-log-reason");

/// Issues API calls while respecting per-bucket and global rate limits
///
/// Cloning is cheap: clones share the HTTP connection pool and the limiter.
#[derive(Clone)]
pub struct Requester {
    http: reqwest::Client,
    base_url: String,
    bot_token: Option<String>,
    user_agent: String,
    limiter: Arc<RateLimiter>,
}

impl Requester {
    /// Create a requester against `base_url`
    pub fn new(base_url: impl Into<String>, bot_token: Option<String>, user_agent: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, bot_token, user_agent)
    }

    /// Create a requester around an existing HTTP client
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        bot_token: Option<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token,
            user_agent: user_agent.into(),
            limiter: RateLimiter::new_shared(),
        }
    }

    /// Build a requester from loaded client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.api.base_url.clone(),
            config.credentials.bot_token.clone(),
            config.api.user_agent.clone(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Shared rate-limit state
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Perform a call and return its decoded JSON body
    ///
    /// Non-2xx statuses other than 429 are not errors: their bodies are
    /// returned to the caller. An empty body decodes to `Value::Null`.
    pub async fn request(&self, request: impl Into<Request>) -> HttpResult<Value> {
        let request = request.into();
        let route = &request.route;
        let default_key = route.bucket_key();
        let bucket = self.limiter.resolve_bucket(route);
        let url = route.url_with_base(&self.base_url);
        let headers = self.headers_for(&request)?;

        // Bucket lock is fixed before waiting at the gate
        let lock = self.limiter.lock_for(&bucket);
        self.limiter.global().wait_open().await;
        let mut guard = BucketGuard::acquire(&bucket, lock).await;

        let mut last_body = Value::Null;

        for attempt in 1..=MAX_ATTEMPTS {
            self.limiter.global().wait_open().await;

            let response = self.send(&request, &url, headers.clone()).await?;
            let status = response.status();
            let limits = RateLimitHeaders::from_headers(response.headers());
            let bytes = response.bytes().await?;
            let body = decode_body(status, &bytes)?;

            debug!(
                route = %route,
                bucket = %guard.bucket(),
                status = status.as_u16(),
                remaining = ?limits.remaining,
                attempt,
                "Response received"
            );

            if let Some(hash) = limits.bucket.as_deref() {
                self.limiter.learn_bucket(&default_key, &mut guard, hash);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = retry_delay(&body, &limits);
                let global = limits.global
                    || body.get("global").and_then(Value::as_bool).unwrap_or(false);

                warn!(
                    route = %route,
                    bucket = %guard.bucket(),
                    retry_after_ms = retry_after.as_millis() as u64,
                    global,
                    attempt,
                    "Rate limited"
                );

                let closed_here = global && self.limiter.global().close();
                tokio::time::sleep(retry_after).await;
                if closed_here {
                    self.limiter.global().reopen();
                }

                last_body = body;
                continue;
            }

            if limits.is_exhausted() {
                let delay = limits.reset_after_duration().unwrap_or_default();
                guard.release_after(delay);
            }

            if !status.is_success() {
                warn!(
                    route = %route,
                    status = status.as_u16(),
                    "Request returned error status"
                );
            }

            return Ok(body);
        }

        warn!(
            route = %route,
            attempts = MAX_ATTEMPTS,
            "Giving up after repeated rate limits"
        );

        Ok(last_body)
    }

    fn headers_for(&self, request: &Request) -> HttpResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent).map_err(|_| HttpError::InvalidHeader("User-Agent"))?,
        );

        let authorization = match &request.auth {
            AuthMode::Bot => self.bot_token.as_ref().map(|token| format!("Bot {token}")),
            AuthMode::Bearer(token) => Some(format!("Bearer {token}")),
            AuthMode::None => None,
        };
        if let Some(value) = authorization {
            let mut value =
                HeaderValue::from_str(&value).map_err(|_| HttpError::InvalidHeader("Authorization"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if let Some(reason) = &request.reason {
            let encoded = urlencoding::encode(reason);
            headers.insert(
                AUDIT_LOG_REASON,
                HeaderValue::from_str(&encoded).map_err(|_| HttpError::InvalidHeader("X-Audit-Log-Reason"))?,
            );
        }

        // reqwest supplies the multipart boundary itself
        if !matches!(request.body, RequestBody::Multipart(_)) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }

    async fn send(&self, request: &Request, url: &str, headers: HeaderMap) -> HttpResult<reqwest::Response> {
        let mut builder = self
            .http
            .request(request.route.method().clone(), url)
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                builder.body(serde_json::to_vec(value).map_err(HttpError::Encode)?)
            }
            RequestBody::Multipart(payload) => builder.multipart(payload.to_form()?),
        };

        Ok(builder.send().await?)
    }
}

impl fmt::Debug for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("base_url", &self.base_url)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("user_agent", &self.user_agent)
            .field("buckets", &self.limiter.lock_count())
            .finish()
    }
}

/// Decode a response body; an empty body is `null`
fn decode_body(status: StatusCode, bytes: &[u8]) -> HttpResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|source| HttpError::Decode {
        status: status.as_u16(),
        source,
    })
}

/// How long to wait after a 429: body `retry_after`, then the reset header, then one second
fn retry_delay(body: &Value, limits: &RateLimitHeaders) -> Duration {
    body.get("retry_after")
        .and_then(Value::as_f64)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .or_else(|| limits.reset_after_duration())
        .unwrap_or(FALLBACK_RETRY)
}
