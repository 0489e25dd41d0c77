//! Engine module - the per-version protocol state machine.
//!
//! An [`Engine`] owns one socket and one [`Session`]. Its lifecycle is
//!
//! ```text
//! Disconnected ─► Handshaking ─► TransportUpgrading ─► Connected ─► Closed
//! ```
//!
//! `Closed` is terminal: connecting again needs a new engine.
//!
//! The protocol generation is fixed at construction. Every operation
//! matches on it, so the 0.x and 1.x/2.x grammars never mix.
//!
//! # Example
//!
//! ```ignore
//! use socketio_ws_client::codec::ProtocolVersion;
//! use socketio_ws_client::engine::{Engine, EngineOptions};
//!
//! let mut engine = Engine::new(ProtocolVersion::V2, "http://localhost:1337", EngineOptions::default())?;
//! engine.connect().await?;
//! engine.emit("action", &serde_json::json!({"foo": "bar"})).await?;
//! engine.close().await;
//! ```

mod keep_alive;
mod options;
mod url;

pub use options::{EngineOptions, Transport, DEFAULT_POLL_TIMEOUT, DEFAULT_TIMEOUT, DEFAULT_WAIT};
pub use url::{ServerUrl, DEFAULT_HOST, DEFAULT_PATH};

use std::collections::HashSet;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::codec::{
    is_default_namespace, normalize_namespace, Packet, ProtocolVersion, SocketPacket,
    TransportPacket, V0Codec, V1Codec,
};
use crate::error::{Result, SocketIoError};
use crate::handler::{EventContext, HandlerRegistry, HandlerResult, SharedHandler};
use crate::handshake::{
    self, generate_key, parse_legacy_session, parse_session, read_upgrade_response,
    HandshakeResponse, UpgradeRequest,
};
use crate::protocol::{read_frame, Frame, OpCode};
use crate::session::Session;
use crate::transport::{self, BoxedSocket};

/// Transport the engine upgrades to.
const WEBSOCKET: &str = "websocket";

/// Lifecycle state of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, nothing sent yet.
    Disconnected,
    /// Session negotiated over HTTP.
    Handshaking,
    /// Switching the raw socket to WebSocket.
    TransportUpgrading,
    /// WebSocket open.
    Connected,
    /// Socket closed. Terminal.
    Closed,
}

/// Outcome of waiting for the socket to become readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Ready,
    Idle,
    Eof,
}

/// Socket.IO protocol engine.
pub struct Engine {
    version: ProtocolVersion,
    url: ServerUrl,
    options: EngineOptions,
    state: EngineState,
    session: Option<Session>,
    cookies: Vec<String>,
    socket: Option<BufReader<BoxedSocket>>,
    namespace: String,
    namespaces: HashSet<String>,
    handlers: HandlerRegistry,
}

impl Engine {
    /// Create an engine for `url`.
    pub fn new(version: ProtocolVersion, url: &str, options: EngineOptions) -> Result<Self> {
        Ok(Self {
            version,
            url: ServerUrl::parse(url)?,
            options,
            state: EngineState::Disconnected,
            session: None,
            cookies: Vec::new(),
            socket: None,
            namespace: String::new(),
            namespaces: HashSet::new(),
            handlers: HandlerRegistry::new(),
        })
    }

    /// Replace the event handlers.
    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Protocol generation.
    #[inline]
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Engine name, e.g. `SocketIO Version 2.X`.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.version.name()
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the WebSocket is open.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Session negotiated by the handshake.
    #[inline]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Active namespace. Empty for the default namespace.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Cookies captured during the handshake.
    #[inline]
    pub fn cookies(&self) -> &[String] {
        &self.cookies
    }

    /// Server location.
    #[inline]
    pub fn url(&self) -> &ServerUrl {
        &self.url
    }

    /// Options fixed at construction.
    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Event handlers run by [`Engine::keep_alive`].
    #[inline]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Register a handler for `event`.
    pub fn on<F, T, Fut>(&mut self, event: &str, handler: F) -> SharedHandler
    where
        F: Fn(T, EventContext) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers.register(event, handler)
    }

    /// Add a shared handler for `event`. Returns false for a duplicate.
    pub fn add_handler(&mut self, event: &str, handler: SharedHandler) -> bool {
        self.handlers.add(event, handler)
    }

    /// Protocol number sent in the handshake.
    fn protocol(&self) -> u8 {
        self.options
            .version
            .unwrap_or_else(|| self.version.default_protocol())
    }

    fn unsupported(&self, action: &'static str) -> SocketIoError {
        SocketIoError::UnsupportedAction {
            engine: self.name(),
            action,
        }
    }

    // ------------------------------------------------------------------
    // Connecting
    // ------------------------------------------------------------------

    /// Handshake, open the socket and upgrade it to WebSocket.
    ///
    /// Does nothing if already connected. A failed attempt leaves the
    /// engine `Disconnected` so the caller may retry.
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            EngineState::Connected => return Ok(()),
            EngineState::Closed => return Err(SocketIoError::ConnectionClosed),
            _ => {}
        }

        if let Err(e) = self.establish().await {
            tracing::warn!(engine = self.name(), error = %e, "connect failed");
            self.socket = None;
            self.session = None;
            self.cookies.clear();
            self.state = EngineState::Disconnected;
            return Err(e);
        }

        Ok(())
    }

    async fn establish(&mut self) -> Result<()> {
        self.handshake().await?;
        let socket = transport::connect(&self.url, &self.options).await?;
        self.upgrade_transport(socket).await
    }

    /// URL of the handshake request.
    pub fn handshake_url(&self) -> String {
        let base = self.url.http_base();
        match self.version {
            ProtocolVersion::V0 => {
                let mut url = format!("{}/{}", base, self.protocol());
                if let Some(query) = self.url.own_query() {
                    url.push_str("/?");
                    url.push_str(&query);
                }
                url
            }
            ProtocolVersion::V1 | ProtocolVersion::V2 => {
                let query = self.url.merged_query(&[
                    ("use_b64", flag(self.options.use_base64)),
                    ("EIO", self.protocol().to_string()),
                    ("transport", self.options.transport.as_str().to_string()),
                ]);
                format!("{}/?{}", base, query)
            }
        }
    }

    /// Request target of the WebSocket upgrade for session `sid`.
    pub fn upgrade_path(&self, sid: &str) -> String {
        match self.version {
            ProtocolVersion::V0 => {
                let mut path = format!(
                    "/{}/{}/{}/{}",
                    self.url.path(),
                    self.protocol(),
                    WEBSOCKET,
                    sid
                );
                if let Some(query) = self.url.own_query() {
                    path.push_str("/?");
                    path.push_str(&query);
                }
                path
            }
            ProtocolVersion::V1 | ProtocolVersion::V2 => {
                let query = self.url.merged_query(&[
                    ("sid", sid.to_string()),
                    ("EIO", self.protocol().to_string()),
                    ("use_b64", flag(self.options.use_base64)),
                    ("transport", WEBSOCKET.to_string()),
                ]);
                format!("/{}/?{}", self.url.path(), query)
            }
        }
    }

    /// Negotiate a session over HTTP. Skipped if one already exists.
    pub async fn handshake(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        self.state = EngineState::Handshaking;
        let url = self.handshake_url();
        let response = handshake::fetch(&url, &self.options).await?;
        self.accept_handshake(response)
    }

    /// Adopt the session described by a handshake response.
    ///
    /// Fails with [`SocketIoError::UnsupportedTransport`] unless the server
    /// offers `websocket`.
    pub fn accept_handshake(&mut self, response: HandshakeResponse) -> Result<()> {
        let session = match self.version {
            ProtocolVersion::V0 => parse_legacy_session(&response.body)?,
            ProtocolVersion::V1 | ProtocolVersion::V2 => parse_session(&response.body)?,
        };

        if !session.supports(WEBSOCKET) {
            return Err(SocketIoError::UnsupportedTransport(WEBSOCKET.to_string()));
        }

        tracing::info!(
            engine = self.name(),
            sid = session.id(),
            ping_interval = ?session.ping_interval(),
            ping_timeout = ?session.ping_timeout(),
            "handshake complete"
        );

        self.state = EngineState::Handshaking;
        self.session = Some(session);
        self.cookies = response.cookies;
        Ok(())
    }

    /// Switch `socket` to WebSocket for the negotiated session.
    ///
    /// 1.x/2.x engines then send UPGRADE; 2.x engines also discard the
    /// packet some servers push right after it.
    pub async fn upgrade_transport(&mut self, socket: BoxedSocket) -> Result<()> {
        let sid = self
            .session
            .as_ref()
            .map(|s| s.id().to_string())
            .ok_or_else(|| {
                SocketIoError::ProtocolViolation("transport upgrade before handshake".to_string())
            })?;

        self.state = EngineState::TransportUpgrading;

        let path = self.upgrade_path(&sid);
        let host = self.url.host_header();
        let key = generate_key();
        let cookie = (!self.cookies.is_empty()).then(|| self.cookies.join("; "));
        let request = UpgradeRequest {
            path: &path,
            host: &host,
            key: &key,
            cookie: cookie.as_deref(),
            headers: &self.options.headers,
        }
        .to_http();

        let mut reader = BufReader::new(socket);
        let limit = self.options.timeout;
        let exchange = async {
            reader.get_mut().write_all(request.as_bytes()).await?;
            reader.get_mut().flush().await?;
            read_upgrade_response(&mut reader).await
        };
        tokio::time::timeout(limit, exchange).await.map_err(|_| {
            SocketIoError::ServerConnectionFailure(format!(
                "no answer to the transport upgrade within {:?}",
                limit
            ))
        })??;

        self.socket = Some(reader);
        self.state = EngineState::Connected;
        tracing::debug!(engine = self.name(), %path, "transport upgraded");

        if !self.version.is_legacy() {
            self.write_packet(TransportPacket::Upgrade, "").await?;
        }

        if self.version == ProtocolVersion::V2 {
            match self.wait_readable().await? {
                Readiness::Ready => {
                    let frame = self.next_frame().await?;
                    tracing::debug!(packet = %frame.text(), "discarded post-upgrade packet");
                }
                Readiness::Idle => {}
                Readiness::Eof => {
                    self.drop_socket("peer closed during upgrade");
                    return Err(SocketIoError::ConnectionClosed);
                }
            }
        }

        // A namespace chosen before connecting is joined now.
        self.join_namespace().await
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Write a packet of type `code` carrying `message`.
    ///
    /// `code` must be a valid type for this version. Writing on an engine
    /// without an open socket does nothing.
    pub async fn write(&mut self, code: u8, message: &str) -> Result<()> {
        let kind = TransportPacket::from_code(code, self.version)?;
        self.write_packet(kind, message).await
    }

    /// Emit `event` with `args` on the active namespace.
    pub async fn emit<T>(&mut self, event: &str, args: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        match self.version {
            ProtocolVersion::V0 => {
                let body = V0Codec::event_payload(event, args)?;
                self.write_packet(TransportPacket::Event, &body).await
            }
            ProtocolVersion::V1 | ProtocolVersion::V2 => {
                let body = V1Codec::event_payload(event, args)?;
                let message = V1Codec::encode_message(SocketPacket::Event, &self.namespace, &body);
                self.write_packet(TransportPacket::Message, &message).await
            }
        }
    }

    /// Send a Socket.IO packet of `kind` on the active namespace.
    ///
    /// Only 1.x/2.x engines have a Socket.IO packet layer; binary kinds are
    /// not supported.
    pub async fn send(&mut self, kind: SocketPacket, data: &str) -> Result<()> {
        if self.version.is_legacy() || kind.is_binary() {
            return Err(self.unsupported("send"));
        }

        let message = V1Codec::encode_message(kind, &self.namespace, data);
        self.write_packet(TransportPacket::Message, &message).await
    }

    /// Switch to `namespace`, joining it first if needed.
    ///
    /// A namespace is joined once per connection; switching back to it
    /// sends nothing. Before the transport is upgraded this only records
    /// the namespace, which is joined as soon as the upgrade completes.
    pub async fn of(&mut self, namespace: &str) -> Result<()> {
        self.namespace = normalize_namespace(namespace);
        self.join_namespace().await
    }

    /// Send CONNECT for the active namespace unless it is the default one or
    /// already joined.
    async fn join_namespace(&mut self) -> Result<()> {
        let namespace = self.namespace.clone();

        if is_default_namespace(&namespace) || !self.is_connected() {
            return Ok(());
        }
        if !self.namespaces.insert(namespace.clone()) {
            tracing::debug!(%namespace, "namespace already joined");
            return Ok(());
        }

        tracing::debug!(engine = self.name(), %namespace, "joining namespace");
        match self.version {
            ProtocolVersion::V0 => self.write_packet(TransportPacket::Open, "").await,
            ProtocolVersion::V1 | ProtocolVersion::V2 => {
                let message = V1Codec::encode_message(SocketPacket::Connect, &namespace, "");
                self.write_packet(TransportPacket::Message, &message).await
            }
        }
    }

    /// Encode and write one packet, then settle for `options.wait`.
    async fn write_packet(&mut self, kind: TransportPacket, data: &str) -> Result<()> {
        if self.socket.is_none() {
            return Ok(());
        }

        let raw = match self.version {
            ProtocolVersion::V0 => V0Codec::encode(kind, self.legacy_endpoint(kind), data)?,
            ProtocolVersion::V1 | ProtocolVersion::V2 => V1Codec::encode(kind, data)?,
        };

        tracing::trace!(packet = %raw, "write");
        self.write_frame(OpCode::Text, raw.as_bytes()).await?;

        if !self.options.wait.is_zero() {
            tokio::time::sleep(self.options.wait).await;
        }
        Ok(())
    }

    /// 0.x packets scoped to a namespace carry it as their endpoint.
    fn legacy_endpoint(&self, kind: TransportPacket) -> &str {
        match kind {
            TransportPacket::Open
            | TransportPacket::Message
            | TransportPacket::JsonMessage
            | TransportPacket::Event
            | TransportPacket::Ack => &self.namespace,
            _ => "",
        }
    }

    /// Write one masked frame.
    async fn write_frame(&mut self, opcode: OpCode, payload: &[u8]) -> Result<()> {
        let Some(reader) = self.socket.as_mut() else {
            return Ok(());
        };

        let bytes = Frame::encode(payload, opcode, true);
        let socket = reader.get_mut();
        socket.write_all(&bytes).await?;
        socket.flush().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Read one frame and return its payload as text.
    ///
    /// Returns an empty string if no socket is open.
    pub async fn read(&mut self) -> Result<String> {
        if self.socket.is_none() {
            return Ok(String::new());
        }

        let frame = self.next_frame().await?;
        Ok(frame.text().into_owned())
    }

    /// Decode a packet in this engine's grammar.
    pub fn decode(&self, raw: &str) -> Result<Packet> {
        match self.version {
            ProtocolVersion::V0 => V0Codec::decode(raw),
            ProtocolVersion::V1 | ProtocolVersion::V2 => V1Codec::decode(raw),
        }
    }

    /// Read one frame; a peer that went away closes the engine.
    async fn next_frame(&mut self) -> Result<Frame> {
        let Some(reader) = self.socket.as_mut() else {
            return Err(SocketIoError::ConnectionClosed);
        };

        match read_frame(reader).await {
            Err(SocketIoError::ConnectionClosed) => {
                self.drop_socket("peer closed the connection");
                Err(SocketIoError::ConnectionClosed)
            }
            other => other,
        }
    }

    /// Wait up to `options.poll_timeout` for buffered or incoming bytes.
    pub(crate) async fn wait_readable(&mut self) -> Result<Readiness> {
        let Some(reader) = self.socket.as_mut() else {
            return Ok(Readiness::Eof);
        };

        match tokio::time::timeout(self.options.poll_timeout, reader.fill_buf()).await {
            Err(_) => Ok(Readiness::Idle),
            Ok(Ok([])) => Ok(Readiness::Eof),
            Ok(Ok(_)) => Ok(Readiness::Ready),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Closing
    // ------------------------------------------------------------------

    /// Send CLOSE, shut the socket and forget the session.
    ///
    /// Never fails; calling it again does nothing.
    pub async fn close(&mut self) {
        if self.state == EngineState::Closed {
            return;
        }

        if self.socket.is_some() {
            if let Err(e) = self.write_packet(TransportPacket::Close, "").await {
                tracing::debug!(error = %e, "close packet not delivered");
            }
            if let Some(mut reader) = self.socket.take() {
                if let Err(e) = reader.get_mut().shutdown().await {
                    tracing::debug!(error = %e, "socket shutdown failed");
                }
            }
        }

        self.session = None;
        self.cookies.clear();
        self.namespaces.clear();
        self.state = EngineState::Closed;
        tracing::debug!(engine = self.name(), "closed");
    }

    /// Drop the socket after the peer ended the connection.
    pub(crate) fn drop_socket(&mut self, reason: &str) {
        if self.socket.take().is_some() {
            tracing::debug!(engine = self.name(), reason, "connection ended");
        }
        self.session = None;
        self.namespaces.clear();
        self.state = EngineState::Closed;
    }
}

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}
