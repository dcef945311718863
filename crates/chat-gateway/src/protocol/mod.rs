//! Gateway protocol definitions
//!
//! Op codes, close codes, the frame format and handshake payloads.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::{GatewayMessage, READY_EVENT};
pub use opcodes::OpCode;
pub use payloads::{
    HelloPayload, IdentifyPayload, IdentifyProperties, PresencePayload, ReadyPayload,
    ResumePayload, Status,
};
