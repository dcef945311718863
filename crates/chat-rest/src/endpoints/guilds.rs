//! Guild, member and ban endpoints

use crate::client::{Request, Requester};
use crate::error::HttpResult;
use crate::route::Route;
use chat_core::{image_data_uri, Nullable, Snowflake};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

/// Guild settings to change; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditGuild {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub name: Nullable<String>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub description: Nullable<String>,
    /// Data URI; set with [`EditGuild::with_icon`]
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub icon: Nullable<String>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub verification_level: Nullable<u8>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub afk_channel_id: Nullable<Snowflake>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub afk_timeout: Nullable<u32>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub system_channel_id: Nullable<Snowflake>,
}

impl EditGuild {
    /// Upload a new icon from raw PNG, JPEG, GIF or WEBP bytes
    pub fn with_icon(mut self, image: &[u8]) -> HttpResult<Self> {
        self.icon = Nullable::Value(image_data_uri(image)?);
        Ok(self)
    }
}

/// Member attributes to change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditMember {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub nick: Nullable<String>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub roles: Nullable<Vec<Snowflake>>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub mute: Nullable<bool>,
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub deaf: Nullable<bool>,
    /// Voice channel to move the member to; `Null` disconnects them
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub channel_id: Nullable<Snowflake>,
    /// ISO 8601 timestamp until which the member is timed out
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub communication_disabled_until: Nullable<String>,
}

pub async fn get_guild(http: &Requester, guild_id: Snowflake, with_counts: bool) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}").param("guild_id", guild_id);
    let request = Request::new(route).with_query("with_counts", with_counts);
    http.request(request).await
}

pub async fn edit_guild(
    http: &Requester,
    guild_id: Snowflake,
    edit: &EditGuild,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PATCH, "/guilds/{guild_id}").param("guild_id", guild_id);
    http.request(Request::new(route).with_json(edit)?.with_reason(reason)).await
}

pub async fn get_guild_channels(http: &Requester, guild_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}/channels").param("guild_id", guild_id);
    http.request(route).await
}

pub async fn get_member(http: &Requester, guild_id: Snowflake, user_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}/members/{user_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id);
    http.request(route).await
}

/// Page through members ordered by user id
pub async fn list_members(
    http: &Requester,
    guild_id: Snowflake,
    limit: Option<u16>,
    after: Option<Snowflake>,
) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}/members").param("guild_id", guild_id);
    let request = Request::new(route)
        .with_query_opt("limit", limit)
        .with_query_opt("after", after);
    http.request(request).await
}

/// Members whose username or nickname starts with `query`
pub async fn search_members(
    http: &Requester,
    guild_id: Snowflake,
    query: &str,
    limit: Option<u16>,
) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}/members/search").param("guild_id", guild_id);
    let request = Request::new(route)
        .with_query("query", query)
        .with_query_opt("limit", limit);
    http.request(request).await
}

pub async fn edit_member(
    http: &Requester,
    guild_id: Snowflake,
    user_id: Snowflake,
    edit: &EditMember,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PATCH, "/guilds/{guild_id}/members/{user_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id);
    http.request(Request::new(route).with_json(edit)?.with_reason(reason)).await
}

/// Change the bot's own nickname; `Null` resets it
pub async fn edit_current_member(
    http: &Requester,
    guild_id: Snowflake,
    nick: Nullable<&str>,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PATCH, "/guilds/{guild_id}/members/@me").param("guild_id", guild_id);
    let body = match nick {
        Nullable::Absent => json!({}),
        Nullable::Null => json!({ "nick": null }),
        Nullable::Value(nick) => json!({ "nick": nick }),
    };
    http.request(Request::new(route).with_json(&body)?.with_reason(reason)).await
}

pub async fn add_member_role(
    http: &Requester,
    guild_id: Snowflake,
    user_id: Snowflake,
    role_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PUT, "/guilds/{guild_id}/members/{user_id}/roles/{role_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id)
        .param("role_id", role_id);
    http.request(Request::new(route).with_reason(reason)).await
}

pub async fn remove_member_role(
    http: &Requester,
    guild_id: Snowflake,
    user_id: Snowflake,
    role_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/guilds/{guild_id}/members/{user_id}/roles/{role_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id)
        .param("role_id", role_id);
    http.request(Request::new(route).with_reason(reason)).await
}

pub async fn kick_member(
    http: &Requester,
    guild_id: Snowflake,
    user_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/guilds/{guild_id}/members/{user_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id);
    http.request(Request::new(route).with_reason(reason)).await
}

pub async fn get_bans(http: &Requester, guild_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}/bans").param("guild_id", guild_id);
    http.request(route).await
}

pub async fn get_ban(http: &Requester, guild_id: Snowflake, user_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/guilds/{guild_id}/bans/{user_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id);
    http.request(route).await
}

/// Ban a user, optionally deleting their recent messages (0-7 days)
pub async fn ban_member(
    http: &Requester,
    guild_id: Snowflake,
    user_id: Snowflake,
    delete_message_days: u8,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::PUT, "/guilds/{guild_id}/bans/{user_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id);
    let request = Request::new(route)
        .with_json(&json!({ "delete_message_days": delete_message_days.min(7) }))?
        .with_reason(reason);
    http.request(request).await
}

pub async fn unban_member(
    http: &Requester,
    guild_id: Snowflake,
    user_id: Snowflake,
    reason: Option<&str>,
) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/guilds/{guild_id}/bans/{user_id}")
        .param("guild_id", guild_id)
        .param("user_id", user_id);
    http.request(Request::new(route).with_reason(reason)).await
}
