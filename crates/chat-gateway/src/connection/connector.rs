//! Socket opening
//!
//! [`Connector`] is the seam between the connection state machine and the
//! network. The default implementation dials with tokio-tungstenite.

use super::sender::BoxedSink;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Read half of a gateway socket
pub type BoxedStream = Pin<Box<dyn Stream<Item = Result<Message, WsError>> + Send>>;

/// Opens gateway sockets
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a socket to `url`, returning its write and read halves
    async fn connect(&self, url: &str) -> GatewayResult<(BoxedSink, BoxedStream)>;
}

/// Dials the gateway over TLS with tokio-tungstenite
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    user_agent: String,
}

impl TungsteniteConnector {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> GatewayResult<(BoxedSink, BoxedStream)> {
        let mut request = url.into_client_request()?;
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| GatewayError::Config(format!("invalid User-Agent: {}", self.user_agent)))?;
        request.headers_mut().insert(USER_AGENT, user_agent);

        let (socket, response) = tokio_tungstenite::connect_async(request).await?;
        tracing::debug!(url = %url, status = %response.status(), "Gateway socket opened");

        let (sink, stream) = socket.split();
        Ok((Box::pin(sink), Box::pin(stream)))
    }
}
