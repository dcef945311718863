//! Application command endpoints
//!
//! Command definitions are passed as raw JSON so any option shape the server
//! accepts can be registered.

use crate::client::{Request, Requester};
use crate::error::HttpResult;
use crate::route::Route;
use chat_core::Snowflake;
use reqwest::Method;
use serde_json::Value;

/// Where a command is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Global,
    Guild(Snowflake),
}

fn scoped(method: Method, global: &'static str, guild: &'static str, application_id: Snowflake, scope: CommandScope) -> Route {
    match scope {
        CommandScope::Global => Route::new(method, global).param("application_id", application_id),
        CommandScope::Guild(guild_id) => Route::new(method, guild)
            .param("application_id", application_id)
            .param("guild_id", guild_id),
    }
}

pub async fn get_commands(http: &Requester, application_id: Snowflake, scope: CommandScope) -> HttpResult<Value> {
    let route = scoped(
        Method::GET,
        "/applications/{application_id}/commands",
        "/applications/{application_id}/guilds/{guild_id}/commands",
        application_id,
        scope,
    );
    http.request(route).await
}

pub async fn get_command(
    http: &Requester,
    application_id: Snowflake,
    scope: CommandScope,
    command_id: Snowflake,
) -> HttpResult<Value> {
    let route = scoped(
        Method::GET,
        "/applications/{application_id}/commands/{command_id}",
        "/applications/{application_id}/guilds/{guild_id}/commands/{command_id}",
        application_id,
        scope,
    )
    .param("command_id", command_id);
    http.request(route).await
}

/// Create a command, replacing any existing one with the same name
pub async fn create_command(
    http: &Requester,
    application_id: Snowflake,
    scope: CommandScope,
    command: &Value,
) -> HttpResult<Value> {
    let route = scoped(
        Method::POST,
        "/applications/{application_id}/commands",
        "/applications/{application_id}/guilds/{guild_id}/commands",
        application_id,
        scope,
    );
    http.request(Request::new(route).with_json(command)?).await
}

pub async fn edit_command(
    http: &Requester,
    application_id: Snowflake,
    scope: CommandScope,
    command_id: Snowflake,
    changes: &Value,
) -> HttpResult<Value> {
    let route = scoped(
        Method::PATCH,
        "/applications/{application_id}/commands/{command_id}",
        "/applications/{application_id}/guilds/{guild_id}/commands/{command_id}",
        application_id,
        scope,
    )
    .param("command_id", command_id);
    http.request(Request::new(route).with_json(changes)?).await
}

pub async fn delete_command(
    http: &Requester,
    application_id: Snowflake,
    scope: CommandScope,
    command_id: Snowflake,
) -> HttpResult<Value> {
    let route = scoped(
        Method::DELETE,
        "/applications/{application_id}/commands/{command_id}",
        "/applications/{application_id}/guilds/{guild_id}/commands/{command_id}",
        application_id,
        scope,
    )
    .param("command_id", command_id);
    http.request(route).await
}

/// Replace the whole command set in one call
pub async fn bulk_overwrite_commands(
    http: &Requester,
    application_id: Snowflake,
    scope: CommandScope,
    commands: &[Value],
) -> HttpResult<Value> {
    let route = scoped(
        Method::PUT,
        "/applications/{application_id}/commands",
        "/applications/{application_id}/guilds/{guild_id}/commands",
        application_id,
        scope,
    );
    http.request(Request::new(route).with_json(commands)?).await
}

pub async fn get_command_permissions(
    http: &Requester,
    application_id: Snowflake,
    guild_id: Snowflake,
    command_id: Option<Snowflake>,
) -> HttpResult<Value> {
    let route = match command_id {
        Some(command_id) => Route::new(
            Method::GET,
            "/applications/{application_id}/guilds/{guild_id}/commands/{command_id}/permissions",
        )
        .param("command_id", command_id),
        None => Route::new(
            Method::GET,
            "/applications/{application_id}/guilds/{guild_id}/commands/permissions",
        ),
    };
    let route = route
        .param("application_id", application_id)
        .param("guild_id", guild_id);
    http.request(route).await
}
