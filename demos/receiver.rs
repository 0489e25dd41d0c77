//! Receiver - listen for events until the server hangs up.
//!
//! This example demonstrates:
//! - Registering typed event handlers with `.on()`
//! - Reading extra arguments from the `EventContext`
//! - Keeping the connection alive with heartbeats
//!
//! # Running against a Socket.IO 2.x server
//!
//! ```js
//! const io = require('socket.io')(1337);
//! io.on('connection', (socket) => {
//!     let n = 0;
//!     const timer = setInterval(() => socket.emit('news', { title: `item ${n++}` }, n), 1000);
//!     socket.on('disconnect', () => clearInterval(timer));
//! });
//! ```
//!
//! ```sh
//! RUST_LOG=info cargo run --example receiver -- http://localhost:1337
//! ```

use serde::Deserialize;
use socketio_ws_client::{Client, EventContext, ProtocolVersion};
use tracing_subscriber::EnvFilter;

/// First argument of the `news` event.
#[derive(Deserialize, Debug)]
struct News {
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:1337".to_string());

    let mut client = Client::builder(url)
        .version(ProtocolVersion::V2)
        .on("news", |news: News, ctx: EventContext| async move {
            let sequence: Option<u64> = ctx.arg(1).ok();
            tracing::info!(title = %news.title, ?sequence, "news");
            Ok(())
        })
        .build()?;

    // Returns once the server closes the connection.
    client.initialize(true).await?;
    tracing::info!("server closed the connection");
    Ok(())
}
