//! Rate-limit response headers

use reqwest::header::HeaderMap;
use std::time::Duration;

pub const BUCKET: &str = "x-ratelimit-bucket";
pub const LIMIT: &str = "x-ratelimit-limit";
pub const REMAINING: &str = "x-ratelimit-remaining";
pub const RESET_AFTER: &str = "x-ratelimit-reset-after";
pub const GLOBAL: &str = "x-ratelimit-global";
pub const SCOPE: &str = "x-ratelimit-scope";

/// Rate-limit information carried by a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    /// Server-assigned bucket hash
    pub bucket: Option<String>,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Seconds until the bucket resets (fractional)
    pub reset_after: Option<f64>,
    pub global: bool,
    /// `user`, `global` or `shared`
    pub scope: Option<String>,
}

impl RateLimitHeaders {
    /// Extract the rate-limit headers, ignoring any that are malformed
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self {
            bucket: text(BUCKET).map(String::from),
            limit: text(LIMIT).and_then(|v| v.parse().ok()),
            remaining: text(REMAINING).and_then(|v| v.parse().ok()),
            reset_after: text(RESET_AFTER)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0),
            global: text(GLOBAL).is_some_and(|v| v.eq_ignore_ascii_case("true")),
            scope: text(SCOPE).map(String::from),
        }
    }

    /// True when the bucket has no requests left in the current window
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Reset window as a duration
    pub fn reset_after_duration(&self) -> Option<Duration> {
        self.reset_after
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}
