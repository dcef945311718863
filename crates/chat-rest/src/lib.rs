//! # chat-rest
//!
//! REST transport for the chat platform API.
//!
//! Every request goes through [`Requester::request`], which serializes calls per
//! rate-limit bucket, honours the process-wide global throttle and retries
//! throttled (429) responses. The [`endpoints`] modules are thin functions that
//! build a [`Route`] and a body, then hand both to the requester.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod ratelimit;
pub mod route;

pub use client::{AuthMode, FileAttachment, MultipartPayload, Request, RequestBody, Requester};
pub use error::{HttpError, HttpResult};
pub use ratelimit::{BucketGuard, GlobalGate, RateLimitHeaders, RateLimiter};
pub use route::{ParamValue, Route, DEFAULT_API_BASE};
