//! Handshake module - HTTP session negotiation and the WebSocket upgrade.
//!
//! Connecting happens in two steps:
//!
//! 1. An HTTP GET ([`fetch`]) returns the session parameters, parsed by
//!    [`parse_legacy_session`] (0.x) or [`parse_session`] (1.x/2.x)
//! 2. On the raw socket, an [`UpgradeRequest`] switches the connection to
//!    WebSocket and [`read_upgrade_response`] checks the answer
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::handshake::{parse_legacy_session, parse_session};
//!
//! let session = parse_legacy_session("4d4f185e96a7b:15:10:websocket,xhr-polling").unwrap();
//! assert_eq!(session.id(), "4d4f185e96a7b");
//!
//! let body = r#"97:0{"sid":"abc","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":60000}"#;
//! let session = parse_session(body).unwrap();
//! assert!(session.supports("websocket"));
//! ```

mod http;
mod upgrade;

pub use http::{fetch, HandshakeResponse};
pub use upgrade::{
    generate_key, read_upgrade_response, UpgradeRequest, MAX_HEADER_LINE, SWITCHING_PROTOCOLS,
};

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SocketIoError};
use crate::session::Session;

/// Parse a 0.x handshake body: `sid:heartbeat:timeout:transports`.
///
/// Timings are in seconds; an empty heartbeat disables heartbeating.
pub fn parse_legacy_session(body: &str) -> Result<Session> {
    let parts: Vec<&str> = body.trim().splitn(4, ':').collect();
    let [sid, interval, timeout, transports] = parts[..] else {
        return Err(SocketIoError::ProtocolViolation(format!(
            "malformed 0.x handshake body {:?}",
            body
        )));
    };

    if sid.is_empty() {
        return Err(SocketIoError::ProtocolViolation(
            "handshake returned an empty session id".to_string(),
        ));
    }

    Ok(Session::new(
        sid,
        Duration::from_secs(parse_seconds(interval)?),
        Duration::from_secs(parse_seconds(timeout)?),
        transports.split(',').map(str::trim).filter(|t| !t.is_empty()),
    ))
}

fn parse_seconds(field: &str) -> Result<u64> {
    if field.is_empty() {
        return Ok(0);
    }
    field.parse().map_err(|_| {
        SocketIoError::ProtocolViolation(format!("invalid handshake timing {:?}", field))
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenPacket {
    sid: String,
    #[serde(default)]
    upgrades: Vec<String>,
    #[serde(default)]
    ping_interval: u64,
    #[serde(default)]
    ping_timeout: u64,
}

/// Parse a 1.x/2.x handshake body.
///
/// Polling payloads wrap the OPEN packet in framing bytes (`97:0{...}`);
/// everything outside the outermost braces is ignored. Timings are in
/// milliseconds.
pub fn parse_session(body: &str) -> Result<Session> {
    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(SocketIoError::ProtocolViolation(format!(
                "handshake body has no JSON object: {:?}",
                body
            )))
        }
    };

    let open: OpenPacket = serde_json::from_str(json)?;

    Ok(Session::new(
        open.sid,
        Duration::from_millis(open.ping_interval),
        Duration::from_millis(open.ping_timeout),
        open.upgrades,
    ))
}
