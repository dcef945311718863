//! # chat-gateway
//!
//! Client side of the real-time gateway: the frame protocol, zlib-stream
//! reassembly, heartbeating, and a connection that identifies, resumes and
//! forwards dispatch events to an [`EventRouter`].

pub mod connection;
pub mod error;
pub mod events;
pub mod frame;
pub mod heartbeat;
pub mod protocol;
pub mod url;

pub use connection::{
    ConnectionState, Connector, GatewayConfig, GatewayConnection, ResumeState,
    TungsteniteConnector,
};
pub use error::{GatewayError, GatewayResult};
pub use events::{DispatchEvent, EventRouter, ListenerId};
pub use frame::{FrameAssembler, FrameError};
pub use heartbeat::{HeartbeatMonitor, HeartbeatTimer};
pub use url::gateway_url;
