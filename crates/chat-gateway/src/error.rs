//! Gateway errors

use crate::frame::FrameError;
use crate::protocol::{CloseCode, OpCode};
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Errors that end a gateway connection
///
/// Frame decode failures are logged and dropped by the connection; they only
/// surface here from the lower-level helpers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[source] Box<WsError>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    /// No frame arrived within the receive timeout
    #[error("No frame received for {0:?}")]
    Timeout(Duration),

    /// The server closed the socket (or the stream ended)
    #[error("Gateway closed the connection (code {code:?}): {reason}")]
    Closed { code: Option<u16>, reason: String },

    /// The server invalidated the session and it cannot be resumed
    #[error("Session invalidated by the gateway")]
    InvalidSession,

    /// The handshake received something other than the expected frame
    #[error("Expected {expected} but received {received}")]
    UnexpectedOpcode { expected: OpCode, received: OpCode },

    #[error("Not connected")]
    NotConnected,

    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// The gateway close code, if the server sent a known one
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::Closed { code: Some(code), .. } => CloseCode::from_u16(*code),
            _ => None,
        }
    }

    /// Whether an external reconnect can succeed without a configuration change
    pub fn can_reconnect(&self) -> bool {
        match self {
            Self::Config(_) => false,
            _ => self.close_code().map_or(true, CloseCode::can_reconnect),
        }
    }

    /// Whether the next connection should resume instead of identifying again
    pub fn is_resumable(&self) -> bool {
        match self {
            Self::InvalidSession | Self::Config(_) => false,
            _ => self.close_code().map_or(true, CloseCode::is_resumable),
        }
    }
}

impl From<WsError> for GatewayError {
    fn from(err: WsError) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
