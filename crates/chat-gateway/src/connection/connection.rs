//! Gateway connection state machine
//!
//! One connection owns one socket at a time. The handshake is shared by the
//! first connect and every reconnect:
//!
//! 1. open the socket (the resume URL when a session exists)
//! 2. wait for Hello, start the heartbeat timer and send one heartbeat
//! 3. send Resume if a session id was captured, otherwise Identify
//!
//! After that [`GatewayConnection::poll`] handles one frame at a time. Any
//! socket error or receive timeout tears the socket down and is returned to
//! the caller; retrying is the caller's decision.
//!
//! Every dispatch, READY included, goes to the event receiver. READY also
//! fills in the session id and resume URL before it is forwarded. Forwarding
//! never waits: when the receiver lags `EVENT_BUFFER` events behind, further
//! dispatches are dropped with a warning so the socket keeps being read and
//! heartbeats keep flowing.

use super::connector::{BoxedStream, Connector};
use super::sender::GatewaySender;
use super::session::{GatewaySession, ResumeState};
use crate::error::{GatewayError, GatewayResult};
use crate::events::DispatchEvent;
use crate::frame::FrameAssembler;
use crate::heartbeat::{HeartbeatMonitor, HeartbeatTimer};
use crate::protocol::{
    GatewayMessage, HelloPayload, IdentifyPayload, IdentifyProperties, OpCode, PresencePayload,
    ResumePayload,
};
use crate::url::gateway_url;
use chat_common::ClientConfig;
use chat_core::Intents;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Close code sent when dropping a socket to reconnect
///
/// Anything other than 1000/1001 keeps the session resumable server side.
pub const RECONNECT_CLOSE_CODE: u16 = 4000;

/// Close code for a deliberate shutdown
pub const NORMAL_CLOSE_CODE: u16 = 1000;

/// Capacity of the dispatch event channel
const EVENT_BUFFER: usize = 256;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingHello,
    Ready,
    Reconnecting,
}

/// Settings for one gateway connection
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base gateway URL; query parameters are appended when connecting
    pub url: String,
    pub token: String,
    pub intents: Intents,
    pub properties: IdentifyProperties,
    pub presence: PresencePayload,
    /// Negotiate `compress=zlib-stream`
    pub compress: bool,
    pub receive_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            intents: Intents::DEFAULT,
            properties: IdentifyProperties::default(),
            presence: PresencePayload::default(),
            compress: true,
            receive_timeout: Duration::from_secs(120),
        }
    }

    /// Build from the loaded client configuration; requires a bot token
    pub fn from_client_config(config: &ClientConfig) -> GatewayResult<Self> {
        let token = config
            .require_bot_token()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            intents: config.gateway.intents,
            receive_timeout: config.gateway.receive_timeout(),
            ..Self::new(&config.gateway.url, token)
        })
    }

    #[must_use]
    pub fn with_intents(mut self, intents: Intents) -> Self {
        self.intents = intents;
        self
    }

    #[must_use]
    pub fn with_presence(mut self, presence: PresencePayload) -> Self {
        self.presence = presence;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn identify(&self) -> IdentifyPayload {
        IdentifyPayload {
            properties: self.properties.clone(),
            presence: Some(self.presence.clone()),
            ..IdentifyPayload::new(&self.token, self.intents)
        }
    }
}

struct Socket {
    sender: GatewaySender,
    stream: BoxedStream,
}

/// A client connection to the gateway
pub struct GatewayConnection {
    config: GatewayConfig,
    connector: Arc<dyn Connector>,
    state: ConnectionState,
    session: GatewaySession,
    socket: Option<Socket>,
    assembler: FrameAssembler,
    heartbeat: Option<HeartbeatTimer>,
    monitor: Arc<HeartbeatMonitor>,
    events: mpsc::Sender<DispatchEvent>,
}

impl GatewayConnection {
    /// Create a disconnected connection and the receiver for its dispatch events
    pub fn new(
        config: GatewayConfig,
        connector: Arc<dyn Connector>,
    ) -> (Self, mpsc::Receiver<DispatchEvent>) {
        let (events, receiver) = mpsc::channel(EVENT_BUFFER);

        let connection = Self {
            config,
            connector,
            state: ConnectionState::Disconnected,
            session: GatewaySession::new(),
            socket: None,
            assembler: FrameAssembler::new(),
            heartbeat: None,
            monitor: Arc::new(HeartbeatMonitor::new()),
            events,
        };
        (connection, receiver)
    }

    /// Resume a previous session on the next connect instead of identifying
    #[must_use]
    pub fn with_resume(mut self, state: ResumeState) -> Self {
        self.session = GatewaySession::from_resume(state);
        self
    }

    // === Accessors ===

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.session_id.as_deref()
    }

    pub fn sequence(&self) -> Option<u64> {
        self.session.sequence.get()
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.session.heartbeat_interval
    }

    /// Round trip of the last acknowledged heartbeat
    pub fn latency(&self) -> Option<Duration> {
        self.monitor.latency()
    }

    pub fn resume_state(&self) -> Option<ResumeState> {
        self.session.resume_state()
    }

    /// Take the session out so a new connection can resume it
    pub fn take_resume_state(&mut self) -> Option<ResumeState> {
        let state = self.session.resume_state();
        self.session.invalidate();
        state
    }

    // === Lifecycle ===

    /// Open the socket and complete the Hello / Identify (or Resume) handshake
    pub async fn connect(&mut self) -> GatewayResult<()> {
        if self.socket.is_some() {
            return Ok(());
        }

        match self.handshake().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.teardown().await;
                Err(e)
            }
        }
    }

    /// Receive and handle a single frame
    pub async fn poll(&mut self) -> GatewayResult<()> {
        if self.socket.is_none() {
            return Err(GatewayError::NotConnected);
        }

        let result = self.poll_frame().await;
        if let Err(e) = &result {
            tracing::warn!(
                error = %e,
                resumable = e.is_resumable(),
                session_id = ?self.session.session_id,
                "Gateway connection failed"
            );
            self.teardown().await;
        }
        result
    }

    /// Connect if needed, then handle frames until the connection fails
    pub async fn run(&mut self) -> GatewayResult<()> {
        self.connect().await?;
        loop {
            self.poll().await?;
        }
    }

    /// Stop heartbeating, then close the socket normally
    pub async fn close(&mut self) -> GatewayResult<()> {
        self.stop_heartbeat().await;
        let result = match self.socket.take() {
            Some(socket) => socket.sender.close(NORMAL_CLOSE_CODE, "closing").await,
            None => Ok(()),
        };
        self.state = ConnectionState::Disconnected;
        tracing::info!("Gateway connection closed");
        result
    }

    /// Change the client's presence (op 3)
    pub async fn update_presence(&mut self, presence: PresencePayload) -> GatewayResult<()> {
        self.send(&GatewayMessage::presence_update(&presence)).await?;
        self.config.presence = presence;
        Ok(())
    }

    // === Internals ===

    async fn handshake(&mut self) -> GatewayResult<()> {
        self.state = ConnectionState::Connecting;

        let resuming = self.session.can_resume();
        let base = match &self.session.resume_url {
            Some(url) if resuming => url.as_str(),
            _ => self.config.url.as_str(),
        };
        let url = gateway_url(base, self.config.compress);
        tracing::info!(url = %url, resuming, "Connecting to gateway");

        let (sink, stream) = self.connector.connect(&url).await?;
        // Each socket carries its own zlib stream
        self.assembler = FrameAssembler::new();
        self.socket = Some(Socket {
            sender: GatewaySender::new(sink),
            stream,
        });
        self.state = ConnectionState::AwaitingHello;

        let hello = loop {
            if let Some(message) = self.next_message().await? {
                break message;
            }
        };
        if hello.op != OpCode::Hello {
            return Err(GatewayError::UnexpectedOpcode {
                expected: OpCode::Hello,
                received: hello.op,
            });
        }
        let hello: HelloPayload = serde_json::from_value(hello.d)?;

        self.start_heartbeat(hello.interval()).await?;
        self.send_heartbeat().await?;

        if let Some(state) = self.session.resume_state() {
            let resume = ResumePayload {
                token: self.config.token.clone(),
                session_id: state.session_id,
                seq: state.sequence,
            };
            self.send(&GatewayMessage::resume(&resume)).await?;
            tracing::info!(session_id = %resume.session_id, seq = ?resume.seq, "Resume sent");
        } else {
            self.send(&GatewayMessage::identify(&self.config.identify())).await?;
            tracing::info!(intents = self.config.intents.bits(), "Identify sent");
        }

        self.state = ConnectionState::Ready;
        Ok(())
    }

    async fn poll_frame(&mut self) -> GatewayResult<()> {
        let Some(message) = self.next_message().await? else {
            return Ok(());
        };

        if let Some(sequence) = message.s {
            self.session.sequence.set(sequence);
        }

        match message.op {
            OpCode::Dispatch => self.handle_dispatch(message),
            OpCode::Heartbeat => self.send_heartbeat().await?,
            OpCode::HeartbeatAck => {
                self.monitor.record_ack();
                tracing::trace!(latency = ?self.monitor.latency(), "Heartbeat acknowledged");
            }
            OpCode::Reconnect => {
                tracing::info!("Gateway requested reconnect");
                self.reconnect().await?;
            }
            OpCode::InvalidSession => {
                if message.as_invalid_session().unwrap_or(false) {
                    tracing::info!("Session invalidated, resuming");
                    self.reconnect().await?;
                } else {
                    tracing::warn!(session_id = ?self.session.session_id, "Session invalidated");
                    self.session.invalidate();
                    return Err(GatewayError::InvalidSession);
                }
            }
            OpCode::Hello => match message.as_hello() {
                Some(hello) => self.start_heartbeat(hello.interval()).await?,
                None => tracing::warn!("Dropping malformed Hello"),
            },
            op => tracing::debug!(op = %op, "Ignoring unexpected opcode"),
        }
        Ok(())
    }

    fn handle_dispatch(&mut self, message: GatewayMessage) {
        if let Some(ready) = message.as_ready() {
            tracing::info!(session_id = %ready.session_id, "Gateway session ready");
            self.session.session_id = Some(ready.session_id);
            self.session.resume_url = ready.resume_gateway_url;
        }

        if let Some(event) = DispatchEvent::from_message(message) {
            tracing::trace!(event = %event.name, seq = ?event.sequence, "Dispatch received");
            match self.events.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(event)) => tracing::warn!(
                    event = %event.name,
                    seq = ?event.sequence,
                    capacity = EVENT_BUFFER,
                    "Event buffer full, dropping dispatch"
                ),
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!("Event receiver dropped, discarding dispatch");
                }
            }
        }
    }

    /// Drop the current socket and handshake again, resuming if possible
    async fn reconnect(&mut self) -> GatewayResult<()> {
        self.state = ConnectionState::Reconnecting;
        self.stop_heartbeat().await;

        if let Some(socket) = self.socket.take() {
            if let Err(e) = socket.sender.close(RECONNECT_CLOSE_CODE, "reconnecting").await {
                tracing::debug!(error = %e, "Close before reconnect failed");
            }
        }

        self.handshake().await
    }

    /// Read until one complete gateway frame is decoded
    ///
    /// `Ok(None)` means a frame arrived but produced nothing (partial zlib
    /// fragment, control frame, or a frame that failed to decode).
    async fn next_message(&mut self) -> GatewayResult<Option<GatewayMessage>> {
        let timeout = self.config.receive_timeout;
        let socket = self.socket.as_mut().ok_or(GatewayError::NotConnected)?;

        let frame = match tokio::time::timeout(timeout, socket.stream.next()).await {
            Err(_) => return Err(GatewayError::Timeout(timeout)),
            Ok(None) => {
                return Err(GatewayError::Closed {
                    code: None,
                    reason: "stream ended".to_string(),
                })
            }
            Ok(Some(frame)) => frame?,
        };

        let text = match frame {
            Message::Text(text) => self.assembler.push_text(text),
            Message::Binary(bytes) => match self.assembler.push(&bytes) {
                Ok(Some(text)) => text,
                Ok(None) => return Ok(None),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping undecodable frame");
                    return Ok(None);
                }
            },
            Message::Close(frame) => {
                let (code, reason) = frame.map_or((None, String::new()), |f| {
                    (Some(u16::from(f.code)), f.reason.to_string())
                });
                return Err(GatewayError::Closed { code, reason });
            }
            _ => return Ok(None),
        };

        match GatewayMessage::from_json(&text) {
            Ok(message) => {
                tracing::trace!(op = %message.op, "Frame received");
                Ok(Some(message))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed gateway frame");
                Ok(None)
            }
        }
    }

    async fn send(&self, message: &GatewayMessage) -> GatewayResult<()> {
        match &self.socket {
            Some(socket) => socket.sender.send(message).await,
            None => Err(GatewayError::NotConnected),
        }
    }

    async fn send_heartbeat(&self) -> GatewayResult<()> {
        self.send(&GatewayMessage::heartbeat(self.session.sequence.get()))
            .await?;
        self.monitor.record_sent();
        Ok(())
    }

    async fn start_heartbeat(&mut self, interval: Duration) -> GatewayResult<()> {
        self.stop_heartbeat().await;
        let sender = match &self.socket {
            Some(socket) => socket.sender.clone(),
            None => return Err(GatewayError::NotConnected),
        };

        self.heartbeat = Some(HeartbeatTimer::start(
            interval,
            sender,
            self.session.sequence.clone(),
            self.monitor.clone(),
        ));
        self.session.heartbeat_interval = Some(interval);
        Ok(())
    }

    async fn stop_heartbeat(&mut self) {
        if let Some(timer) = self.heartbeat.take() {
            timer.stop().await;
        }
    }

    /// Release the socket; the session is kept so the next connect can resume
    async fn teardown(&mut self) {
        self.stop_heartbeat().await;
        self.socket = None;
        self.state = ConnectionState::Disconnected;
    }
}

impl std::fmt::Debug for GatewayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConnection")
            .field("url", &self.config.url)
            .field("state", &self.state)
            .field("session_id", &self.session.session_id)
            .field("sequence", &self.session.sequence.get())
            .field("heartbeat", &self.heartbeat)
            .finish_non_exhaustive()
    }
}
