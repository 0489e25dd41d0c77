//! Transport module - raw byte streams under the WebSocket layer.
//!
//! Provides:
//! - [`Socket`]: any bidirectional async byte stream
//! - [`connect`]: TCP connect, TLS wrapped for secured URLs
//!
//! # Example
//!
//! ```ignore
//! use socketio_ws_client::engine::{EngineOptions, ServerUrl};
//! use socketio_ws_client::transport::connect;
//!
//! let url = ServerUrl::parse("https://example.com")?;
//! let socket = connect(&url, &EngineOptions::default()).await?;
//! ```

mod tcp;
mod tls;

pub use tcp::connect;
pub use tls::{tls_connector, NoCertificateVerification};

use tokio::io::{AsyncRead, AsyncWrite};

/// Bidirectional byte stream owned by an engine.
///
/// Implemented for every `AsyncRead + AsyncWrite + Unpin + Send + Sync` type, so
/// plain TCP, TLS and in-memory duplex streams are interchangeable.
pub trait Socket: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Sync> Socket for T {}

/// Boxed socket.
pub type BoxedSocket = Box<dyn Socket>;
