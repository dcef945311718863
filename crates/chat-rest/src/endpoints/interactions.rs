//! Interaction responses and followups
//!
//! Interaction tokens authorize these calls; no bot token is sent. Followups
//! and the original response live on the application's webhook.

use super::message::MessagePayload;
use super::webhooks::{self, WebhookMessage, WebhookMessageId};
use crate::client::{FileAttachment, Request, Requester};
use crate::error::HttpResult;
use crate::route::Route;
use chat_core::Snowflake;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// Kind of reply to an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum CallbackType {
    Pong,
    ChannelMessage,
    DeferredChannelMessage,
    DeferredUpdateMessage,
    UpdateMessage,
    AutocompleteResult,
    Modal,
}

impl From<CallbackType> for u8 {
    fn from(kind: CallbackType) -> Self {
        match kind {
            CallbackType::Pong => 1,
            CallbackType::ChannelMessage => 4,
            CallbackType::DeferredChannelMessage => 5,
            CallbackType::DeferredUpdateMessage => 6,
            CallbackType::UpdateMessage => 7,
            CallbackType::AutocompleteResult => 8,
            CallbackType::Modal => 9,
        }
    }
}

#[derive(Debug, Serialize)]
struct Callback<'a> {
    #[serde(rename = "type")]
    kind: CallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

/// Respond to an interaction
pub async fn create_response(
    http: &Requester,
    interaction_id: Snowflake,
    token: &str,
    kind: CallbackType,
    data: Option<&Value>,
) -> HttpResult<Value> {
    let route = Route::new(Method::POST, "/interactions/{interaction_id}/{interaction_token}/callback")
        .param("interaction_id", interaction_id)
        .param("interaction_token", token);
    let request = Request::new(route)
        .with_json(&Callback { kind, data })?
        .unauthenticated();
    http.request(request).await
}

pub async fn get_original_response(http: &Requester, application_id: Snowflake, token: &str) -> HttpResult<Value> {
    webhooks::get_webhook_message(http, application_id, token, WebhookMessageId::Original, None).await
}

pub async fn edit_original_response(
    http: &Requester,
    application_id: Snowflake,
    token: &str,
    message: &MessagePayload,
    files: Vec<FileAttachment>,
) -> HttpResult<Value> {
    webhooks::edit_webhook_message(http, application_id, token, WebhookMessageId::Original, message, files, None)
        .await
}

pub async fn delete_original_response(http: &Requester, application_id: Snowflake, token: &str) -> HttpResult<Value> {
    webhooks::delete_webhook_message(http, application_id, token, WebhookMessageId::Original, None).await
}

/// Send a followup message; the created message is returned
pub async fn create_followup(
    http: &Requester,
    application_id: Snowflake,
    token: &str,
    message: &MessagePayload,
    files: Vec<FileAttachment>,
) -> HttpResult<Value> {
    let message = WebhookMessage::from(message.clone());
    webhooks::execute_webhook(http, application_id, token, &message, files, true, None).await
}

pub async fn get_followup(
    http: &Requester,
    application_id: Snowflake,
    token: &str,
    message_id: Snowflake,
) -> HttpResult<Value> {
    webhooks::get_webhook_message(http, application_id, token, message_id.into(), None).await
}

pub async fn edit_followup(
    http: &Requester,
    application_id: Snowflake,
    token: &str,
    message_id: Snowflake,
    message: &MessagePayload,
    files: Vec<FileAttachment>,
) -> HttpResult<Value> {
    webhooks::edit_webhook_message(http, application_id, token, message_id.into(), message, files, None).await
}

pub async fn delete_followup(
    http: &Requester,
    application_id: Snowflake,
    token: &str,
    message_id: Snowflake,
) -> HttpResult<Value> {
    webhooks::delete_webhook_message(http, application_id, token, message_id.into(), None).await
}
