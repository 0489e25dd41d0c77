//! Socket.IO 0.x grammar: `type:id:endpoint:data`.
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::codec::{TransportPacket, V0Codec};
//!
//! let raw = V0Codec::encode(TransportPacket::Open, "/chat", "").unwrap();
//! assert_eq!(raw, "1::/chat:");
//!
//! let packet = V0Codec::decode("5:::{\"name\":\"news\",\"args\":[]}").unwrap();
//! assert_eq!(packet.kind, TransportPacket::Event);
//! ```

use serde::Serialize;

use super::packet::Packet;
use super::types::{ProtocolVersion, TransportPacket};
use crate::error::{Result, SocketIoError};

#[derive(Serialize)]
struct LegacyEventBody<'a, T: ?Sized> {
    name: &'a str,
    args: &'a T,
}

/// Colon-delimited codec used by 0.x engines.
pub struct V0Codec;

impl V0Codec {
    /// Encode a packet. The message id is always left empty.
    pub fn encode(kind: TransportPacket, endpoint: &str, data: &str) -> Result<String> {
        let code = kind.code(ProtocolVersion::V0).ok_or_else(|| {
            SocketIoError::InvalidArgument(format!("{:?} does not exist in Socket.IO 0.x", kind))
        })?;

        Ok(format!("{}::{}:{}", code, endpoint, data))
    }

    /// JSON body of an EVENT packet: `{"name": ..., "args": ...}`.
    pub fn event_payload<T: Serialize + ?Sized>(name: &str, args: &T) -> Result<String> {
        Ok(serde_json::to_string(&LegacyEventBody { name, args })?)
    }

    /// Decode a packet. Colons inside the data field are preserved.
    pub fn decode(raw: &str) -> Result<Packet> {
        let mut parts = raw.splitn(4, ':');

        let code_str = parts.next().unwrap_or_default();
        let code: u8 = code_str.parse().map_err(|_| {
            SocketIoError::ProtocolViolation(format!("invalid 0.x packet type in {:?}", raw))
        })?;
        let kind = TransportPacket::from_code(code, ProtocolVersion::V0)
            .map_err(|e| SocketIoError::ProtocolViolation(e.to_string()))?;

        let id = parts
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let namespace = parts.next().unwrap_or_default().to_string();
        let data = parts.next().unwrap_or_default().to_string();

        Ok(Packet {
            kind,
            inner: None,
            id,
            namespace,
            data,
        })
    }
}
