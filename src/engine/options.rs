//! Engine configuration.

use std::time::Duration;

/// Default connect and handshake timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default settle delay after every write.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(100);

/// Default bound on each keep-alive readability wait.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport requested during the 1.x/2.x handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Long polling; the engine upgrades to WebSocket afterwards.
    #[default]
    Polling,
    /// WebSocket from the start.
    Websocket,
}

impl Transport {
    /// Name used in the `transport` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Polling => "polling",
            Transport::Websocket => "websocket",
        }
    }
}

/// Engine options. Fixed once the engine is created.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Bound on the handshake request and the socket connect.
    pub timeout: Duration,
    /// Sleep after each frame written.
    pub wait: Duration,
    /// Bound on each keep-alive wait for readability.
    pub poll_timeout: Duration,
    /// Transport named in the handshake.
    pub transport: Transport,
    /// Protocol number override (0.x path segment, or `EIO` for 1.x/2.x).
    pub version: Option<u8>,
    /// Extra headers for the handshake and the upgrade request.
    pub headers: Vec<(String, String)>,
    /// Verify the server certificate on TLS connections.
    pub tls_verify: bool,
    /// Ask the server for base64 payloads.
    pub use_base64: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            wait: DEFAULT_WAIT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            transport: Transport::default(),
            version: None,
            headers: Vec::new(),
            tls_verify: true,
            use_base64: false,
        }
    }
}

impl EngineOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect and handshake timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the post-write settle delay.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Set the keep-alive readability bound.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Set the handshake transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Override the protocol number.
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = Some(version);
        self
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Enable or disable certificate verification.
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Enable or disable base64 payloads.
    pub fn with_base64(mut self, use_base64: bool) -> Self {
        self.use_base64 = use_base64;
        self
    }
}
