//! The single write path to the gateway socket
//!
//! The receive loop and the heartbeat task both write frames; every write
//! goes through one mutex so frames are never interleaved.

use crate::error::GatewayResult;
use crate::protocol::GatewayMessage;
use futures_util::{Sink, SinkExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Write half of a gateway socket
pub type BoxedSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Cloneable handle to the socket's write half
#[derive(Clone)]
pub struct GatewaySender {
    sink: Arc<Mutex<BoxedSink>>,
}

impl GatewaySender {
    pub fn new(sink: BoxedSink) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Serialize and send one frame
    pub async fn send(&self, message: &GatewayMessage) -> GatewayResult<()> {
        let json = message.to_json()?;
        self.sink.lock().await.send(Message::Text(json)).await?;

        tracing::trace!(op = %message.op, "Frame sent");
        Ok(())
    }

    /// Send a close frame and shut the write half down
    pub async fn close(&self, code: u16, reason: &str) -> GatewayResult<()> {
        let frame = CloseFrame {
            code: WsCloseCode::from(code),
            reason: reason.to_string().into(),
        };

        let mut sink = self.sink.lock().await;
        sink.send(Message::Close(Some(frame))).await?;
        sink.close().await?;
        Ok(())
    }
}

impl std::fmt::Debug for GatewaySender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySender").finish_non_exhaustive()
    }
}
