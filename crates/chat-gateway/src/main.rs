//! Gateway client entry point
//!
//! Run with:
//! ```bash
//! cargo run -p chat-gateway
//! ```
//!
//! Configuration is loaded from environment variables; `BOT_TOKEN` is required.

use chat_common::{try_init_tracing, ClientConfig};
use chat_gateway::{
    DispatchEvent, EventRouter, GatewayConfig, GatewayConnection, ResumeState,
    TungsteniteConnector,
};
use chat_rest::endpoints::{gateway, users};
use chat_rest::Requester;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Gateway client stopped");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    info!(env = ?config.app.env, app = %config.app.name, "Configuration loaded");

    let http = Requester::from_config(&config);
    let me = users::get_current_user(&http).await?;
    info!(
        user = me.get("username").and_then(|v| v.as_str()).unwrap_or("<unknown>"),
        "Logged in"
    );

    let mut gateway_config = GatewayConfig::from_client_config(&config)?;
    match gateway::get_gateway_bot(&http).await {
        Ok(body) => {
            if let Some(url) = gateway::gateway_url(&body) {
                gateway_config.url = url.to_string();
            }
        }
        Err(e) => warn!(error = %e, "Gateway discovery failed, using configured URL"),
    }

    let router = Arc::new(EventRouter::new());
    router.on("READY", |event: DispatchEvent| async move {
        info!(
            session_id = event.data.get("session_id").and_then(|v| v.as_str()).unwrap_or_default(),
            "Session ready"
        );
    });
    router.on("MESSAGE_CREATE", |event: DispatchEvent| async move {
        info!(
            channel_id = event.data.get("channel_id").and_then(|v| v.as_str()).unwrap_or_default(),
            content = event.data.get("content").and_then(|v| v.as_str()).unwrap_or_default(),
            "Message received"
        );
    });

    let connector = Arc::new(TungsteniteConnector::new(config.api.user_agent.clone()));
    let mut resume: Option<ResumeState> = None;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let (connection, events) = GatewayConnection::new(gateway_config.clone(), connector.clone());
        let mut connection = match resume.take() {
            Some(state) => connection.with_resume(state),
            None => connection,
        };
        let listener = tokio::spawn(router.clone().run(events));

        let err = match connection.connect().await {
            Ok(()) => {
                backoff = INITIAL_BACKOFF;
                match connection.run().await {
                    Ok(()) => return Ok(()),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        if err.is_resumable() {
            resume = connection.take_resume_state();
        }
        drop(connection);
        let _ = listener.await;

        if !err.can_reconnect() {
            return Err(err.into());
        }

        warn!(
            error = %err,
            resume = resume.is_some(),
            retry_in_secs = backoff.as_secs(),
            "Gateway disconnected, reconnecting"
        );
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}
