//! Gateway payload definitions
//!
//! The `d` bodies of the handshake frames exchanged with the gateway.

use chat_core::Intents;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after the socket opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }

    /// The heartbeat interval as a duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval)
    }
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,

    /// Event categories the client wants to receive
    pub intents: Intents,

    pub properties: IdentifyProperties,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresencePayload>,

    /// `[shard_id, shard_count]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard: Option<[u32; 2]>,
}

impl IdentifyPayload {
    /// Identify with the default properties and presence
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: IdentifyProperties::default(),
            presence: Some(PresencePayload::default()),
            shard: None,
        }
    }
}

/// Client connection properties, sent under `$`-prefixed keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    #[serde(rename = "$os")]
    pub os: String,

    #[serde(rename = "$browser")]
    pub browser: String,

    #[serde(rename = "$device")]
    pub device: String,
}

impl IdentifyProperties {
    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    #[must_use]
    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = browser.into();
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: env!("CARGO_PKG_NAME").to_string(),
            device: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Online status shown for the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Idle,
    Dnd,
    Invisible,
    Offline,
}

/// Presence sent with Identify or op 3 (Presence Update)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresencePayload {
    /// Unix time in milliseconds since the client went idle
    pub since: Option<u64>,

    /// Activity objects, passed through as raw JSON
    #[serde(default)]
    pub activities: Vec<Value>,

    pub status: Status,

    pub afk: bool,
}

impl PresencePayload {
    #[must_use]
    pub fn with_status(status: Status) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_activity(mut self, activity: Value) -> Self {
        self.activities.push(activity);
        self
    }
}

impl Default for PresencePayload {
    fn default() -> Self {
        Self {
            since: None,
            activities: Vec::new(),
            status: Status::Idle,
            afk: false,
        }
    }
}

/// Payload for op 6 (Resume)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePayload {
    pub token: String,

    /// Session id captured from READY
    pub session_id: String,

    /// Last sequence number received
    pub seq: Option<u64>,
}

/// Payload for op 0 READY (the fields the connection relies on)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,

    /// Gateway URL to use when resuming this session
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}
