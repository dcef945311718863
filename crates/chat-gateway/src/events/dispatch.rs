//! Dispatch events handed from the connection to the router

use crate::protocol::GatewayMessage;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A named event received over the gateway (op 0)
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEvent {
    /// Event name, e.g. `MESSAGE_CREATE`
    pub name: String,
    pub sequence: Option<u64>,
    pub data: Value,
}

impl DispatchEvent {
    pub fn new(name: impl Into<String>, sequence: Option<u64>, data: Value) -> Self {
        Self {
            name: name.into(),
            sequence,
            data,
        }
    }

    /// Build from a dispatch frame; `None` for any other opcode or a missing name
    pub fn from_message(message: GatewayMessage) -> Option<Self> {
        if message.op != crate::protocol::OpCode::Dispatch {
            return None;
        }
        let name = message.t?;
        Some(Self::new(name, message.s, message.d))
    }

    /// Deserialize the payload into a typed struct
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}
