//! Decoded packets and the events they carry.

use serde::Deserialize;
use serde_json::Value;

use super::types::{SocketPacket, TransportPacket};
use crate::error::{Result, SocketIoError};

/// A packet received from the server, in either grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Transport-layer kind.
    pub kind: TransportPacket,
    /// Socket.IO kind inside a 1.x/2.x MESSAGE.
    pub inner: Option<SocketPacket>,
    /// Message or acknowledgement id, if any.
    pub id: Option<String>,
    /// Namespace (endpoint). Empty for the default namespace.
    pub namespace: String,
    /// Remaining payload.
    pub data: String,
}

impl Packet {
    /// Whether this packet carries a named event.
    pub fn is_event(&self) -> bool {
        match self.kind {
            TransportPacket::Event => true,
            TransportPacket::Message => self.inner == Some(SocketPacket::Event),
            _ => false,
        }
    }

    /// Extract the event carried by this packet.
    ///
    /// Returns `Ok(None)` for packets that are not events.
    pub fn event(&self) -> Result<Option<Event>> {
        match self.kind {
            TransportPacket::Event => legacy_event(self).map(Some),
            TransportPacket::Message if self.inner == Some(SocketPacket::Event) => {
                array_event(self).map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// Named event with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name.
    pub name: String,
    /// Namespace the event arrived on.
    pub namespace: String,
    /// Event arguments, in order.
    pub args: Vec<Value>,
    /// Acknowledgement id requested by the server.
    pub id: Option<String>,
}

impl Event {
    /// First argument, or `null` when there is none.
    pub fn first_arg(&self) -> Value {
        self.args.first().cloned().unwrap_or(Value::Null)
    }
}

#[derive(Deserialize)]
struct LegacyEvent {
    name: String,
    #[serde(default)]
    args: Value,
}

/// 0.x: `{"name": ..., "args": [...]}`.
fn legacy_event(packet: &Packet) -> Result<Event> {
    let parsed: LegacyEvent = serde_json::from_str(&packet.data)?;
    let args = match parsed.args {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    Ok(Event {
        name: parsed.name,
        namespace: packet.namespace.clone(),
        args,
        id: packet.id.clone(),
    })
}

/// 1.x/2.x: `["name", arg1, arg2, ...]`.
fn array_event(packet: &Packet) -> Result<Event> {
    let value: Value = serde_json::from_str(&packet.data)?;
    let Value::Array(mut items) = value else {
        return Err(SocketIoError::ProtocolViolation(format!(
            "event payload is not an array: {}",
            packet.data
        )));
    };

    if items.is_empty() {
        return Err(SocketIoError::ProtocolViolation(
            "event payload is empty".to_string(),
        ));
    }

    let name = match items.remove(0) {
        Value::String(name) => name,
        other => {
            return Err(SocketIoError::ProtocolViolation(format!(
                "event name is not a string: {}",
                other
            )))
        }
    };

    Ok(Event {
        name,
        namespace: packet.namespace.clone(),
        args: items,
        id: packet.id.clone(),
    })
}
