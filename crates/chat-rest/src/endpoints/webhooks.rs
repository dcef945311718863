//! Webhook endpoints
//!
//! Routes addressed by `{webhook_id}/{webhook_token}` authenticate through the
//! token in the path and are sent without an `Authorization` header.

use super::message::MessagePayload;
use crate::client::{FileAttachment, Request, Requester};
use crate::error::HttpResult;
use crate::route::{ParamValue, Route};
use chat_core::{image_data_uri, Nullable, Snowflake};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

/// A message sent by a webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookMessageId {
    /// The original response to an interaction (`@original`)
    Original,
    Id(Snowflake),
}

impl From<Snowflake> for WebhookMessageId {
    fn from(id: Snowflake) -> Self {
        Self::Id(id)
    }
}

impl From<WebhookMessageId> for ParamValue {
    fn from(id: WebhookMessageId) -> Self {
        match id {
            WebhookMessageId::Original => Self::Raw("@original".to_string()),
            WebhookMessageId::Id(id) => id.into(),
        }
    }
}

/// Webhook settings to change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditWebhook {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub name: Nullable<String>,
    /// Data URI; set with [`EditWebhook::with_avatar`]
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub avatar: Nullable<String>,
    /// Move the webhook to another channel (bot-authenticated edits only)
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub channel_id: Nullable<Snowflake>,
}

impl EditWebhook {
    pub fn with_avatar(mut self, image: &[u8]) -> HttpResult<Self> {
        self.avatar = Nullable::Value(image_data_uri(image)?);
        Ok(self)
    }
}

/// Message sent through a webhook, with optional identity overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebhookMessage {
    #[serde(flatten)]
    pub message: MessagePayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<MessagePayload> for WebhookMessage {
    fn from(message: MessagePayload) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }
}

fn token_route(method: Method, template: &'static str, webhook_id: Snowflake, token: &str) -> Route {
    Route::new(method, template)
        .param("webhook_id", webhook_id)
        .param("webhook_token", token)
}

/// Create a webhook; `avatar` is raw image bytes
pub async fn create_webhook(
    http: &Requester,
    channel_id: Snowflake,
    name: &str,
    avatar: Option<&[u8]>,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::POST, "/channels/{channel_id}/webhooks").param("channel_id", channel_id);
    let mut body = json!({ "name": name });
    if let Some(image) = avatar {
        body["avatar"] = Value::String(image_data_uri(image)?);
    }
    http.request(Request::new(route).with_json(&body)?.with_reason(reason)).await
}

pub async fn get_channel_webhooks(http: &Requester, channel_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/channels/{channel_id}/webhooks").param("channel_id", channel_id);
    http.request(route).await
}

pub async fn get_guild_webhooks(http: &Requester, guild_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}/webhooks").param("guild_id", guild_id);
    http.request(route).await
}

pub async fn get_webhook(http: &Requester, webhook_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/webhooks/{webhook_id}").param("webhook_id", webhook_id);
    http.request(route).await
}

pub async fn edit_webhook(
    http: &Requester,
    webhook_id: Snowflake,
    edit: &EditWebhook,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PATCH, "/webhooks/{webhook_id}").param("webhook_id", webhook_id);
    http.request(Request::new(route).with_json(edit)?.with_reason(reason)).await
}

pub async fn delete_webhook(http: &Requester, webhook_id: Snowflake, reason: Option<&str>) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/webhooks/{webhook_id}").param("webhook_id", webhook_id);
    http.request(Request::new(route).with_reason(reason)).await
}

pub async fn get_webhook_with_token(http: &Requester, webhook_id: Snowflake, token: &str) -> HttpResult<Value> {
    let route = token_route(Method::GET, "/webhooks/{webhook_id}/{webhook_token}", webhook_id, token);
    http.request(Request::new(route).unauthenticated()).await
}

/// Edit a webhook through its token; `channel_id` is not accepted here
pub async fn edit_webhook_with_token(
    http: &Requester,
    webhook_id: Snowflake,
    token: &str,
    edit: &EditWebhook,
) -> HttpResult<Value> {
    let route = token_route(Method::PATCH, "/webhooks/{webhook_id}/{webhook_token}", webhook_id, token);
    let edit = EditWebhook {
        channel_id: Nullable::Absent,
        ..edit.clone()
    };
    http.request(Request::new(route).with_json(&edit)?.unauthenticated()).await
}

pub async fn delete_webhook_with_token(http: &Requester, webhook_id: Snowflake, token: &str) -> HttpResult<Value> {
    let route = token_route(Method::DELETE, "/webhooks/{webhook_id}/{webhook_token}", webhook_id, token);
    http.request(Request::new(route).unauthenticated()).await
}

/// Execute a webhook
///
/// With `wait` the server responds with the created message instead of an
/// empty body. `thread_id` targets a thread inside the webhook's channel.
pub async fn execute_webhook(
    http: &Requester,
    webhook_id: Snowflake,
    token: &str,
    message: &WebhookMessage,
    files: Vec<FileAttachment>,
    wait: bool,
    thread_id: Option<Snowflake>,
) -> HttpResult<Value> {
    let route = token_route(Method::POST, "/webhooks/{webhook_id}/{webhook_token}", webhook_id, token);
    let request = Request::new(route)
        .with_payload(message, files)?
        .with_query("wait", wait)
        .with_query_opt("thread_id", thread_id)
        .unauthenticated();
    http.request(request).await
}

pub async fn get_webhook_message(
    http: &Requester,
    webhook_id: Snowflake,
    token: &str,
    message_id: WebhookMessageId,
    thread_id: Option<Snowflake>,
) -> HttpResult<Value> {
    let route = token_route(
        Method::GET,
        "/webhooks/{webhook_id}/{webhook_token}/messages/{message_id}",
        webhook_id,
        token,
    )
    .param("message_id", message_id);
    let request = Request::new(route)
        .with_query_opt("thread_id", thread_id)
        .unauthenticated();
    http.request(request).await
}

pub async fn edit_webhook_message(
    http: &Requester,
    webhook_id: Snowflake,
    token: &str,
    message_id: WebhookMessageId,
    message: &MessagePayload,
    files: Vec<FileAttachment>,
    thread_id: Option<Snowflake>,
) -> HttpResult<Value> {
    let route = token_route(
        Method::PATCH,
        "/webhooks/{webhook_id}/{webhook_token}/messages/{message_id}",
        webhook_id,
        token,
    )
    .param("message_id", message_id);
    let request = Request::new(route)
        .with_payload(message, files)?
        .with_query_opt("thread_id", thread_id)
        .unauthenticated();
    http.request(request).await
}

pub async fn delete_webhook_message(
    http: &Requester,
    webhook_id: Snowflake,
    token: &str,
    message_id: WebhookMessageId,
    thread_id: Option<Snowflake>,
) -> HttpResult<Value> {
    let route = token_route(
        Method::DELETE,
        "/webhooks/{webhook_id}/{webhook_token}/messages/{message_id}",
        webhook_id,
        token,
    )
    .param("message_id", message_id);
    let request = Request::new(route)
        .with_query_opt("thread_id", thread_id)
        .unauthenticated();
    http.request(request).await
}
