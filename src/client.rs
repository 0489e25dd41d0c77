//! Client facade over an [`Engine`].
//!
//! The [`ClientBuilder`] collects the server URL, protocol version,
//! options and event handlers. The [`Client`] drives the lifecycle:
//! 1. `initialize` handshakes and upgrades to WebSocket
//! 2. `emit` / `of` / `read` talk to the server
//! 3. `close` (or dropping the client) ends the session
//!
//! # Example
//!
//! ```ignore
//! use socketio_ws_client::{Client, ProtocolVersion};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::builder("http://localhost:1337")
//!         .version(ProtocolVersion::V2)
//!         .on("news", |data: serde_json::Value, _ctx| async move {
//!             println!("news: {}", data);
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     client.initialize(false).await?;
//!     client.emit("action", &serde_json::json!({"foo": "bar"})).await?;
//!     client.close().await;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::ProtocolVersion;
use crate::engine::{Engine, EngineOptions};
use crate::error::{Result, SocketIoError};
use crate::handler::{EventContext, HandlerRegistry, HandlerResult};

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    url: String,
    version: ProtocolVersion,
    options: EngineOptions,
    registry: HandlerRegistry,
}

impl ClientBuilder {
    /// Create a builder for `url`, speaking Socket.IO 2.x by default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: ProtocolVersion::V2,
            options: EngineOptions::default(),
            registry: HandlerRegistry::new(),
        }
    }

    /// Set the protocol generation.
    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Replace all engine options.
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the connect and handshake timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the settle delay after each write.
    pub fn wait(mut self, wait: Duration) -> Self {
        self.options.wait = wait;
        self
    }

    /// Add a header to the handshake and upgrade requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn tls_verify(mut self, verify: bool) -> Self {
        self.options.tls_verify = verify;
        self
    }

    /// Register an event handler, run while keeping the connection alive.
    pub fn on<F, T, Fut>(mut self, event: &str, handler: F) -> Self
    where
        F: Fn(T, EventContext) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.registry.register(event, handler);
        self
    }

    /// Build the client. Fails only on a malformed URL.
    pub fn build(self) -> Result<Client> {
        let engine = Engine::new(self.version, &self.url, self.options)?.with_handlers(self.registry);
        Ok(Client::new(engine))
    }
}

/// Socket.IO client.
///
/// Dropping a connected client closes its engine in the background on the
/// current tokio runtime.
pub struct Client {
    engine: Option<Engine>,
    connected: bool,
}

impl Client {
    /// Create a builder for `url`.
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// Wrap an existing engine.
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Some(engine),
            connected: false,
        }
    }

    /// The underlying engine.
    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    /// Whether `initialize` succeeded and `close` has not run since.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn engine_mut(&mut self) -> Result<&mut Engine> {
        self.engine.as_mut().ok_or(SocketIoError::ConnectionClosed)
    }

    /// Connect to the server, then optionally keep the connection alive
    /// until it ends.
    pub async fn initialize(&mut self, keep_alive: bool) -> Result<()> {
        let engine = self.engine_mut()?;
        tracing::debug!(engine = engine.name(), "connecting to the server");

        if let Err(e) = engine.connect().await {
            let e = match e {
                SocketIoError::Io(io) => SocketIoError::ServerConnectionFailure(io.to_string()),
                other => other,
            };
            tracing::error!(error = %e, "could not connect to the server");
            return Err(e);
        }

        self.connected = true;
        tracing::debug!("connected to the server");

        if keep_alive {
            tracing::debug!("keeping the connection alive");
            self.engine_mut()?.keep_alive().await?;
            self.connected = false;
        }

        Ok(())
    }

    /// Read one message from the server.
    pub async fn read(&mut self) -> Result<String> {
        tracing::debug!("reading a message from the server");
        let data = self.engine_mut()?.read().await?;
        tracing::debug!(len = data.len(), "received a message from the server");
        Ok(data)
    }

    /// Emit `event` with `args`.
    pub async fn emit<T>(&mut self, event: &str, args: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        tracing::debug!(event, "sending a new message");
        self.engine_mut()?.emit(event, args).await?;
        tracing::debug!(event, "message sent");
        Ok(())
    }

    /// Switch to `namespace`.
    pub async fn of(&mut self, namespace: &str) -> Result<()> {
        tracing::debug!(namespace, "setting namespace");
        self.engine_mut()?.of(namespace).await?;
        tracing::debug!(namespace, "namespace set");
        Ok(())
    }

    /// Close the connection. Safe to call more than once.
    pub async fn close(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        tracing::debug!("closing the connection to the server");
        engine.close().await;
        self.connected = false;
        tracing::debug!("closed the connection to the server");
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if !self.connected {
            return;
        }
        let Some(mut engine) = self.engine.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { engine.close().await });
            }
            Err(_) => tracing::debug!("no runtime to close the engine on; dropping the socket"),
        }
    }
}
