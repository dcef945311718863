//! Gateway connection
//!
//! The state machine, the socket seam it connects through, its single send
//! path and the session state that survives reconnects.

mod connection;
mod connector;
mod sender;
mod session;

pub use connection::{
    ConnectionState, GatewayConfig, GatewayConnection, NORMAL_CLOSE_CODE, RECONNECT_CLOSE_CODE,
};
pub use connector::{BoxedStream, Connector, TungsteniteConnector};
pub use sender::{BoxedSink, GatewaySender};
pub use session::{GatewaySession, ResumeState, SequenceTracker};
