//! Channel, message, reaction and pin endpoints

use super::message::MessagePayload;
use crate::client::{FileAttachment, Request, Requester};
use crate::error::HttpResult;
use crate::route::Route;
use chat_core::{Nullable, Snowflake};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

/// Fields of a channel edit; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditChannel {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub name: Nullable<String>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub topic: Nullable<String>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub position: Nullable<u32>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub nsfw: Nullable<bool>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub rate_limit_per_user: Nullable<u32>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub parent_id: Nullable<Snowflake>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub permission_overwrites: Nullable<Vec<Value>>,
}

/// Which slice of history [`get_messages`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAnchor {
    Around(Snowflake),
    Before(Snowflake),
    After(Snowflake),
}

pub async fn get_channel(http: &Requester, channel_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/channels/{channel_id}").param("channel_id", channel_id);
    http.request(route).await
}

pub async fn edit_channel(
    http: &Requester,
    channel_id: Snowflake,
    edit: &EditChannel,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PATCH, "/channels/{channel_id}").param("channel_id", channel_id);
    let request = Request::new(route).with_json(edit)?.with_reason(reason);
    http.request(request).await
}

/// Delete a channel, or close a DM
pub async fn delete_channel(
    http: &Requester,
    channel_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/channels/{channel_id}").param("channel_id", channel_id);
    http.request(Request::new(route).with_reason(reason)).await
}

/// Fetch up to `limit` messages (1-100) relative to an optional anchor
pub async fn get_messages(
    http: &Requester,
    channel_id: Snowflake,
    anchor: Option<MessageAnchor>,
    limit: Option<u8>,
) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/channels/{channel_id}/messages").param("channel_id", channel_id);
    let mut request = Request::new(route).with_query_opt("limit", limit);

    request = match anchor {
        Some(MessageAnchor::Around(id)) => request.with_query("around", id),
        Some(MessageAnchor::Before(id)) => request.with_query("before", id),
        Some(MessageAnchor::After(id)) => request.with_query("after", id),
        None => request,
    };

    http.request(request).await
}

pub async fn get_message(http: &Requester, channel_id: Snowflake, message_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/channels/{channel_id}/messages/{message_id}")
        .param("channel_id", channel_id)
        .param("message_id", message_id);
    http.request(route).await
}

/// Post a message; files switch the body to multipart
pub async fn create_message(
    http: &Requester,
    channel_id: Snowflake,
    message: &MessagePayload,
    files: Vec<FileAttachment>,
) -> HttpResult<Value> {
    let route = Route::new(Method::POST, "/channels/{channel_id}/messages").param("channel_id", channel_id);
    http.request(Request::new(route).with_payload(message, files)?).await
}

pub async fn edit_message(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    message: &MessagePayload,
    files: Vec<FileAttachment>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PATCH, "/channels/{channel_id}/messages/{message_id}")
        .param("channel_id", channel_id)
        .param("message_id", message_id);
    http.request(Request::new(route).with_payload(message, files)?).await
}

pub async fn delete_message(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/channels/{channel_id}/messages/{message_id}")
        .param("channel_id", channel_id)
        .param("message_id", message_id);
    http.request(Request::new(route).with_reason(reason)).await
}

/// Delete 2-100 messages in one call
pub async fn bulk_delete_messages(
    http: &Requester,
    channel_id: Snowflake,
    message_ids: &[Snowflake],
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::POST, "/channels/{channel_id}/messages/bulk-delete")
        .param("channel_id", channel_id);
    let request = Request::new(route)
        .with_json(&json!({ "messages": message_ids }))?
        .with_reason(reason);
    http.request(request).await
}

/// React with a unicode emoji or `name:id` for a custom one
pub async fn add_reaction(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    emoji: &str,
) -> HttpResult<Value> {
    let route = Route::new(
        Method::PUT,
        "/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me",
    )
    .param("channel_id", channel_id)
    .param("message_id", message_id)
    .param("emoji", emoji);
    http.request(route).await
}

pub async fn delete_own_reaction(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    emoji: &str,
) -> HttpResult<Value> {
    let route = Route::new(
        Method::DELETE,
        "/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me",
    )
    .param("channel_id", channel_id)
    .param("message_id", message_id)
    .param("emoji", emoji);
    http.request(route).await
}

pub async fn delete_user_reaction(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    emoji: &str,
    user_id: Snowflake,
) -> HttpResult<Value> {
    let route = Route::new(
        Method::DELETE,
        "/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/{user_id}",
    )
    .param("channel_id", channel_id)
    .param("message_id", message_id)
    .param("emoji", emoji)
    .param("user_id", user_id);
    http.request(route).await
}

pub async fn get_reactions(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    emoji: &str,
    after: Option<Snowflake>,
    limit: Option<u8>,
) -> HttpResult<Value> {
    let route = Route::new(
        Method::GET,
        "/channels/{channel_id}/messages/{message_id}/reactions/{emoji}",
    )
    .param("channel_id", channel_id)
    .param("message_id", message_id)
    .param("emoji", emoji);
    let request = Request::new(route)
        .with_query_opt("after", after)
        .with_query_opt("limit", limit);
    http.request(request).await
}

pub async fn delete_all_reactions(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/channels/{channel_id}/messages/{message_id}/reactions")
        .param("channel_id", channel_id)
        .param("message_id", message_id);
    http.request(route).await
}

pub async fn start_typing(http: &Requester, channel_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::POST, "/channels/{channel_id}/typing").param("channel_id", channel_id);
    http.request(route).await
}

pub async fn get_pinned_messages(http: &Requester, channel_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/channels/{channel_id}/pins").param("channel_id", channel_id);
    http.request(route).await
}

pub async fn pin_message(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PUT, "/channels/{channel_id}/pins/{message_id}")
        .param("channel_id", channel_id)
        .param("message_id", message_id);
    http.request(Request::new(route).with_reason(reason)).await
}

pub async fn unpin_message(
    http: &Requester,
    channel_id: Snowflake,
    message_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/channels/{channel_id}/pins/{message_id}")
        .param("channel_id", channel_id)
        .param("message_id", message_id);
    http.request(Request::new(route).with_reason(reason)).await
}
