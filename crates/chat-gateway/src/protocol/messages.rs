//! Gateway frame format
//!
//! Every frame on the socket is `{"op", "d", "s", "t"}`.

use super::{HelloPayload, IdentifyPayload, OpCode, PresencePayload, ReadyPayload, ResumePayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name of the dispatch that carries the session id
pub const READY_EVENT: &str = "READY";

/// Gateway frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event data; sent as `null` when empty, never omitted
    #[serde(default)]
    pub d: Value,

    /// Sequence number (dispatches only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event name (dispatches only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayMessage {
    /// Create a frame with no sequence or event name
    #[must_use]
    pub fn new(op: OpCode, d: Value) -> Self {
        Self { op, d, s: None, t: None }
    }

    // === Client frames ===

    /// Op 1 carrying the last sequence seen (or null)
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self::new(OpCode::Heartbeat, last_sequence.map_or(Value::Null, Value::from))
    }

    /// Op 2
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self::new(OpCode::Identify, serde_json::to_value(payload).unwrap_or_default())
    }

    /// Op 6
    #[must_use]
    pub fn resume(payload: &ResumePayload) -> Self {
        Self::new(OpCode::Resume, serde_json::to_value(payload).unwrap_or_default())
    }

    /// Op 3
    #[must_use]
    pub fn presence_update(payload: &PresencePayload) -> Self {
        Self::new(OpCode::PresenceUpdate, serde_json::to_value(payload).unwrap_or_default())
    }

    // === Server frames ===

    /// Op 0
    #[must_use]
    pub fn dispatch(event: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            d: data,
            s: Some(sequence),
            t: Some(event.into()),
        }
    }

    /// Op 10
    #[must_use]
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self::new(
            OpCode::Hello,
            serde_json::to_value(HelloPayload::with_interval(heartbeat_interval)).unwrap_or_default(),
        )
    }

    // === Parsing ===

    /// Parse the Hello payload (op 10)
    pub fn as_hello(&self) -> Option<HelloPayload> {
        if self.op != OpCode::Hello {
            return None;
        }
        HelloPayload::deserialize(&self.d).ok()
    }

    /// Parse the READY dispatch payload
    pub fn as_ready(&self) -> Option<ReadyPayload> {
        if !self.is_dispatch_of(READY_EVENT) {
            return None;
        }
        ReadyPayload::deserialize(&self.d).ok()
    }

    /// Whether an Invalid Session (op 9) may be resumed
    pub fn as_invalid_session(&self) -> Option<bool> {
        if self.op != OpCode::InvalidSession {
            return None;
        }
        Some(self.d.as_bool().unwrap_or(false))
    }

    /// Parse the Resume payload (op 6)
    pub fn as_resume(&self) -> Option<ResumePayload> {
        if self.op != OpCode::Resume {
            return None;
        }
        ResumePayload::deserialize(&self.d).ok()
    }

    /// Parse the Identify payload (op 2)
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op != OpCode::Identify {
            return None;
        }
        IdentifyPayload::deserialize(&self.d).ok()
    }

    /// Check whether this is a dispatch of the named event
    #[must_use]
    pub fn is_dispatch_of(&self, event: &str) -> bool {
        self.op == OpCode::Dispatch && self.t.as_deref() == Some(event)
    }

    // === Utilities ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}
