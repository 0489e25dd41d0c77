//! Namespace - talk to a namespace and read the reply.
//!
//! This example demonstrates:
//! - Joining a namespace with `of()`
//! - Emitting into it
//! - Reading a raw packet back with `read()`
//!
//! # Running against a Socket.IO 2.x server
//!
//! ```js
//! const io = require('socket.io')(1337);
//! io.of('/chat').on('connection', (socket) => {
//!     socket.on('message', (text) => socket.emit('message', `echo: ${text}`));
//! });
//! ```
//!
//! ```sh
//! RUST_LOG=debug cargo run --example namespace -- http://localhost:1337 /chat
//! ```

use socketio_ws_client::{Client, ProtocolVersion};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "http://localhost:1337".to_string());
    let namespace = args.next().unwrap_or_else(|| "/chat".to_string());

    let mut client = Client::builder(url).version(ProtocolVersion::V2).build()?;
    client.initialize(false).await?;

    client.of(&namespace).await?;
    client.emit("message", "hello").await?;

    // The first packet may be the namespace CONNECT acknowledgement.
    for _ in 0..2 {
        let packet = client.read().await?;
        println!("{}", packet);
        if packet.starts_with("42") {
            break;
        }
    }

    client.close().await;
    Ok(())
}
