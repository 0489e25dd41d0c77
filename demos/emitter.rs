//! Emitter - connect, send one event, disconnect.
//!
//! This example demonstrates:
//! - Building a client for a chosen protocol version
//! - Emitting an event with a JSON payload
//! - Closing the connection
//!
//! # Running against a Socket.IO 2.x server
//!
//! ```js
//! const io = require('socket.io')(1337);
//! io.on('connection', (socket) => {
//!     socket.on('action', (data) => console.log('action', data));
//! });
//! ```
//!
//! ```sh
//! RUST_LOG=debug cargo run --example emitter -- http://localhost:1337 2
//! ```

use serde::Serialize;
use socketio_ws_client::{Client, ProtocolVersion};
use tracing_subscriber::EnvFilter;

/// Payload of the `action` event.
#[derive(Serialize, Debug)]
struct Action {
    foo: String,
}

fn parse_version(arg: Option<String>) -> ProtocolVersion {
    match arg.as_deref() {
        Some("0") => ProtocolVersion::V0,
        Some("1") => ProtocolVersion::V1,
        _ => ProtocolVersion::V2,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "http://localhost:1337".to_string());
    let version = parse_version(args.next());

    let mut client = Client::builder(url).version(version).build()?;
    client.initialize(false).await?;

    client
        .emit("action", &Action { foo: "bar".to_string() })
        .await?;

    client.close().await;
    Ok(())
}
