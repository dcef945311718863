//! Request description handed to the requester

use super::form::MultipartPayload;
use crate::error::{HttpError, HttpResult};
use crate::route::Route;
use serde::Serialize;
use serde_json::Value;

/// How the `Authorization` header is filled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// `Bot <token>` using the requester's bot token
    #[default]
    Bot,
    /// `Bearer <token>` using an OAuth2 access token
    Bearer(String),
    /// No `Authorization` header (webhook-token and interaction routes)
    None,
}

/// Body sent with a request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartPayload),
}

/// A single API call: route plus everything sent along with it
#[derive(Debug, Clone)]
pub struct Request {
    pub route: Route,
    pub body: RequestBody,
    pub query: Vec<(String, String)>,
    /// Audit log reason, sent as `X-Audit-Log-Reason`
    pub reason: Option<String>,
    pub auth: AuthMode,
}

impl Request {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            body: RequestBody::Empty,
            query: Vec::new(),
            reason: None,
            auth: AuthMode::Bot,
        }
    }

    /// Attach a JSON body
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> HttpResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body).map_err(HttpError::Encode)?);
        Ok(self)
    }

    /// Attach a multipart body (JSON payload plus files)
    #[must_use]
    pub fn with_multipart(mut self, payload: MultipartPayload) -> Self {
        self.body = RequestBody::Multipart(payload);
        self
    }

    /// Send a JSON body, switching to multipart when files are present
    pub fn with_payload<T: Serialize + ?Sized>(
        self,
        body: &T,
        files: Vec<super::FileAttachment>,
    ) -> HttpResult<Self> {
        if files.is_empty() {
            self.with_json(body)
        } else {
            Ok(self.with_multipart(MultipartPayload::new(body, files)?))
        }
    }

    /// Append a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present
    #[must_use]
    pub fn with_query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(String::from);
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    /// Authenticate with an OAuth2 bearer token instead of the bot token
    #[must_use]
    pub fn with_bearer(self, token: impl Into<String>) -> Self {
        self.with_auth(AuthMode::Bearer(token.into()))
    }

    /// Send without an `Authorization` header
    #[must_use]
    pub fn unauthenticated(self) -> Self {
        self.with_auth(AuthMode::None)
    }
}

impl From<Route> for Request {
    fn from(route: Route) -> Self {
        Self::new(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let request = Request::new(Route::new(Method::GET, "/gateway"));
        assert_eq!(request.body, RequestBody::Empty);
        assert_eq!(request.auth, AuthMode::Bot);
        assert!(request.query.is_empty());
        assert!(request.reason.is_none());
    }

    #[test]
    fn test_query_opt_skips_none() {
        let request = Request::new(Route::new(Method::GET, "/users/@me/guilds"))
            .with_query("limit", 50)
            .with_query_opt::<u64>("before", None)
            .with_query_opt("after", Some(10u64));
        assert_eq!(
            request.query,
            vec![
                ("limit".to_string(), "50".to_string()),
                ("after".to_string(), "10".to_string())
            ]
        );
    }

    #[test]
    fn test_payload_without_files_is_json() {
        let request = Request::new(Route::new(Method::POST, "/channels/{channel_id}/messages"))
            .with_payload(&json!({"content": "hi"}), Vec::new())
            .unwrap();
        assert_eq!(request.body, RequestBody::Json(json!({"content": "hi"})));
    }

    #[test]
    fn test_payload_accepts_unsized_body() {
        let route = || Route::new(Method::POST, "/channels/1/messages");
        let body: &str = "plain";

        let request = Request::new(route()).with_payload(body, Vec::new()).unwrap();
        assert_eq!(request.body, RequestBody::Json(json!("plain")));

        let files = vec![super::super::FileAttachment::new("a.bin", vec![0])];
        let err = Request::new(route()).with_payload(body, files).unwrap_err();
        assert!(matches!(err, HttpError::Form(_)));
    }

    #[test]
    fn test_payload_with_files_is_multipart() {
        let files = vec![super::super::FileAttachment::new("a.txt", b"a".to_vec())];
        let request = Request::new(Route::new(Method::POST, "/channels/{channel_id}/messages"))
            .with_payload(&json!({"content": "hi"}), files)
            .unwrap();
        assert!(matches!(request.body, RequestBody::Multipart(_)));
    }

    #[test]
    fn test_bearer_auth() {
        let request = Request::new(Route::new(Method::GET, "/users/@me")).with_bearer("abc");
        assert_eq!(request.auth, AuthMode::Bearer("abc".to_string()));
    }
}
