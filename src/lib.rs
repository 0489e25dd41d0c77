//! # socketio-ws-client
//!
//! Rust client for Socket.IO servers speaking the 0.x, 1.x or 2.x protocol
//! generations, over a raw WebSocket transport.
//!
//! ## Architecture
//!
//! - **Handshake** (HTTP polling): obtains the session id, heartbeat timings
//!   and cookies
//! - **Transport** (WebSocket over TCP or TLS): every packet after the
//!   upgrade travels as a masked text frame
//!
//! ## Example
//!
//! ```ignore
//! use socketio_ws_client::{Client, ProtocolVersion};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::builder("http://localhost:1337")
//!         .version(ProtocolVersion::V2)
//!         .build()?;
//!
//!     client.initialize(false).await?;
//!     client.of("/chat").await?;
//!     client.emit("action", &serde_json::json!({"foo": "bar"})).await?;
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod engine;
pub mod error;
pub mod handler;
pub mod handshake;
pub mod protocol;
pub mod session;
pub mod transport;

mod client;

pub use client::{Client, ClientBuilder};
pub use codec::ProtocolVersion;
pub use engine::{Engine, EngineOptions, EngineState, Transport};
pub use error::SocketIoError;
pub use handler::EventContext;
