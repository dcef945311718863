//! User endpoints

use crate::client::{Request, Requester};
use crate::error::HttpResult;
use crate::route::Route;
use chat_core::{image_data_uri, Snowflake};
use reqwest::Method;
use serde_json::{json, Value};

pub async fn get_current_user(http: &Requester) -> HttpResult<Value> {
    http.request(Route::new(Method::GET, "/users/@me")).await
}

/// The user an OAuth2 bearer token belongs to
pub async fn get_current_user_with_bearer(http: &Requester, access_token: &str) -> HttpResult<Value> {
    let request = Request::new(Route::new(Method::GET, "/users/@me")).with_bearer(access_token);
    http.request(request).await
}

pub async fn get_user(http: &Requester, user_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::GET, "/users/{user_id}").param("user_id", user_id);
    http.request(route).await
}

/// Change the bot's username and/or avatar (raw image bytes)
pub async fn edit_current_user(
    http: &Requester,
    username: Option<&str>,
    avatar: Option<&[u8]>,
) -> HttpResult<Value> {
    let mut body = json!({});
    if let Some(username) = username {
        body["username"] = json!(username);
    }
    if let Some(image) = avatar {
        body["avatar"] = json!(image_data_uri(image)?);
    }
    let request = Request::new(Route::new(Method::PATCH, "/users/@me")).with_json(&body)?;
    http.request(request).await
}

/// Guilds of the user behind an OAuth2 access token (`guilds` scope)
pub async fn get_current_user_guilds(
    http: &Requester,
    access_token: &str,
    before: Option<Snowflake>,
    after: Option<Snowflake>,
    limit: Option<u8>,
) -> HttpResult<Value> {
    let request = Request::new(Route::new(Method::GET, "/users/@me/guilds"))
        .with_query_opt("before", before)
        .with_query_opt("after", after)
        .with_query_opt("limit", limit)
        .with_bearer(access_token);
    http.request(request).await
}

pub async fn leave_guild(http: &Requester, guild_id: Snowflake) -> HttpResult<Value> {
    let route = Route::new(Method::DELETE, "/users/@me/guilds/{guild_id}").param("guild_id", guild_id);
    http.request(route).await
}

/// Open (or fetch the existing) DM channel with a user
pub async fn create_dm(http: &Requester, recipient_id: Snowflake) -> HttpResult<Value> {
    let request = Request::new(Route::new(Method::POST, "/users/@me/channels"))
        .with_json(&json!({ "recipient_id": recipient_id }))?;
    http.request(request).await
}
