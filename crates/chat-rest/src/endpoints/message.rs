//! Message bodies shared by channel, webhook and interaction endpoints

use chat_core::{Nullable, Snowflake};
use serde::Serialize;
use serde_json::Value;

/// Message flag: only the invoking user can see the message
pub const EPHEMERAL: u64 = 1 << 6;

/// Message flag: embeds are not rendered
pub const SUPPRESS_EMBEDS: u64 = 1 << 2;

/// Content of a message being created or edited
///
/// Embeds and components are passed through as raw JSON objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub content: Nullable<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<bool>,

    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub embeds: Nullable<Vec<Value>>,

    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub allowed_mentions: Nullable<Value>,

    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub components: Nullable<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sticker_ids: Vec<Snowflake>,
}

impl MessagePayload {
    /// A plain text message
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Nullable::Value(content.into()),
            ..Self::default()
        }
    }

    pub fn with_embed(mut self, embed: Value) -> Self {
        match &mut self.embeds {
            Nullable::Value(embeds) => embeds.push(embed),
            _ => self.embeds = Nullable::Value(vec![embed]),
        }
        self
    }

    pub fn with_components(mut self, components: Vec<Value>) -> Self {
        self.components = Nullable::Value(components);
        self
    }

    /// Reply to an existing message
    pub fn reply_to(mut self, message_id: Snowflake) -> Self {
        self.message_reference = Some(serde_json::json!({ "message_id": message_id }));
        self
    }

    /// Set or clear a flag bit
    pub fn with_flag(mut self, flag: u64, enabled: bool) -> Self {
        let flags = self.flags.unwrap_or(0);
        self.flags = Some(if enabled { flags | flag } else { flags & !flag });
        self
    }

    pub fn ephemeral(self) -> Self {
        self.with_flag(EPHEMERAL, true)
    }
}
