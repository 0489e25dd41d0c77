//! Engine.IO 2/3 grammar used by Socket.IO 1.x and 2.x.
//!
//! An Engine.IO packet is a single type digit followed by its data. A
//! MESSAGE (`4`) carries a Socket.IO packet: a type digit, an optional
//! `/namespace` terminated by `,`, an optional ack id, then JSON.
//!
//! ```text
//! 4  2  /chat,  12  ["event",{"a":1}]
//! │  │  │       │   └ data
//! │  │  │       └ ack id
//! │  │  └ namespace
//! │  └ Socket.IO EVENT
//! └ Engine.IO MESSAGE
//! ```
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::codec::{SocketPacket, V1Codec};
//!
//! let body = V1Codec::event_payload("action", &serde_json::json!({"foo": "bar"})).unwrap();
//! let message = V1Codec::encode_message(SocketPacket::Event, "", &body);
//! assert_eq!(message, r#"2["action",{"foo":"bar"}]"#);
//! ```

use serde::Serialize;

use super::packet::Packet;
use super::types::{ProtocolVersion, SocketPacket, TransportPacket};
use crate::error::{Result, SocketIoError};

/// Codec used by 1.x and 2.x engines.
pub struct V1Codec;

impl V1Codec {
    /// Encode an Engine.IO packet: type digit followed by `data`.
    pub fn encode(kind: TransportPacket, data: &str) -> Result<String> {
        let code = kind.code(ProtocolVersion::V1).ok_or_else(|| {
            SocketIoError::InvalidArgument(format!(
                "{:?} does not exist in Engine.IO 2/3",
                kind
            ))
        })?;

        Ok(format!("{}{}", code, data))
    }

    /// Encode the Socket.IO part of a MESSAGE (without the leading `4`).
    ///
    /// The namespace is omitted for the default namespace; the `,`
    /// separator is only written when data follows it.
    pub fn encode_message(kind: SocketPacket, namespace: &str, data: &str) -> String {
        let mut out = String::with_capacity(1 + namespace.len() + 1 + data.len());
        out.push(char::from(b'0' + kind.code()));
        if !is_default_namespace(namespace) {
            out.push_str(namespace);
            if !data.is_empty() {
                out.push(',');
            }
        }
        out.push_str(data);
        out
    }

    /// JSON body of an EVENT: `[name, args]`.
    pub fn event_payload<T: Serialize + ?Sized>(name: &str, args: &T) -> Result<String> {
        Ok(serde_json::to_string(&(name, args))?)
    }

    /// Decode an Engine.IO packet, and its Socket.IO packet for MESSAGEs.
    pub fn decode(raw: &str) -> Result<Packet> {
        let code = match raw.as_bytes().first() {
            Some(b) if b.is_ascii_digit() => b - b'0',
            _ => {
                return Err(SocketIoError::ProtocolViolation(format!(
                    "invalid Engine.IO packet {:?}",
                    raw
                )))
            }
        };
        let kind = TransportPacket::from_code(code, ProtocolVersion::V1)
            .map_err(|e| SocketIoError::ProtocolViolation(e.to_string()))?;
        let rest = &raw[1..];

        let plain = |data: &str| Packet {
            kind,
            inner: None,
            id: None,
            namespace: String::new(),
            data: data.to_string(),
        };

        if kind != TransportPacket::Message {
            return Ok(plain(rest));
        }

        let inner = match rest.as_bytes().first() {
            Some(b) if b.is_ascii_digit() => SocketPacket::from_code(b - b'0').ok_or_else(|| {
                SocketIoError::ProtocolViolation(format!("invalid Socket.IO packet {:?}", rest))
            })?,
            _ => return Ok(plain(rest)),
        };

        let mut cursor = 1;

        // Binary packets announce their attachment count as `N-`.
        if inner.is_binary() {
            let digits = count_digits(&rest[cursor..]);
            if digits > 0 && rest[cursor + digits..].starts_with('-') {
                cursor += digits + 1;
            }
        }

        let mut namespace = String::new();
        if rest[cursor..].starts_with('/') {
            let end = rest[cursor..]
                .find(',')
                .map(|i| cursor + i)
                .unwrap_or(rest.len());
            namespace = rest[cursor..end].to_string();
            cursor = if end < rest.len() { end + 1 } else { end };
        }

        let digits = count_digits(&rest[cursor..]);
        let id = (digits > 0).then(|| rest[cursor..cursor + digits].to_string());
        cursor += digits;

        Ok(Packet {
            kind,
            inner: Some(inner),
            id,
            namespace,
            data: rest[cursor..].to_string(),
        })
    }
}

/// Whether `namespace` names the default namespace (`""` or `"/"`).
pub fn is_default_namespace(namespace: &str) -> bool {
    namespace.is_empty() || namespace == "/"
}

/// Canonical namespace form: `""` for the default, otherwise `/name`.
pub fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim();
    if is_default_namespace(trimmed) {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn count_digits(s: &str) -> usize {
    s.bytes().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_control_packets() {
        assert_eq!(V1Codec::encode(TransportPacket::Upgrade, "").unwrap(), "5");
        assert_eq!(V1Codec::encode(TransportPacket::Ping, "").unwrap(), "2");
        assert_eq!(V1Codec::encode(TransportPacket::Close, "").unwrap(), "1");
        assert!(V1Codec::encode(TransportPacket::Event, "").is_err());
    }

    #[test]
    fn test_emit_default_namespace() {
        let body = V1Codec::event_payload("action", &json!({"foo": "bar"})).unwrap();
        let message = V1Codec::encode_message(SocketPacket::Event, "", &body);
        let raw = V1Codec::encode(TransportPacket::Message, &message).unwrap();
        assert_eq!(raw, r#"42["action",{"foo":"bar"}]"#);

        let slash = V1Codec::encode_message(SocketPacket::Event, "/", &body);
        assert_eq!(slash, message);
    }

    #[test]
    fn test_emit_custom_namespace() {
        let body = V1Codec::event_payload("hello", &json!([1, 2])).unwrap();
        let message = V1Codec::encode_message(SocketPacket::Event, "/chat", &body);
        assert_eq!(message, r#"2/chat,["hello",[1,2]]"#);
    }

    #[test]
    fn test_connect_namespace_has_no_separator() {
        assert_eq!(
            V1Codec::encode_message(SocketPacket::Connect, "/chat", ""),
            "0/chat"
        );
        assert_eq!(V1Codec::encode_message(SocketPacket::Connect, "", ""), "0");
    }

    #[test]
    fn test_decode_engine_packets() {
        let packet = V1Codec::decode("3probe").unwrap();
        assert_eq!(packet.kind, TransportPacket::Pong);
        assert_eq!(packet.data, "probe");
        assert!(packet.inner.is_none());

        let packet = V1Codec::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(packet.kind, TransportPacket::Open);
    }

    #[test]
    fn test_decode_event_default_namespace() {
        let packet = V1Codec::decode(r#"42["news",{"hello":"world"}]"#).unwrap();
        assert_eq!(packet.kind, TransportPacket::Message);
        assert_eq!(packet.inner, Some(SocketPacket::Event));
        assert_eq!(packet.namespace, "");
        assert_eq!(packet.id, None);

        let event = packet.event().unwrap().unwrap();
        assert_eq!(event.name, "news");
        assert_eq!(event.args, vec![json!({"hello": "world"})]);
    }

    #[test]
    fn test_decode_event_with_namespace_and_id() {
        let packet = V1Codec::decode(r#"42/chat,17["msg","hi"]"#).unwrap();
        assert_eq!(packet.namespace, "/chat");
        assert_eq!(packet.id.as_deref(), Some("17"));
        assert_eq!(packet.data, r#"["msg","hi"]"#);
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = V1Codec::decode("40").unwrap();
        assert_eq!(packet.inner, Some(SocketPacket::Connect));
        assert_eq!(packet.namespace, "");

        let packet = V1Codec::decode("40/chat").unwrap();
        assert_eq!(packet.namespace, "/chat");
        assert_eq!(packet.data, "");
    }

    #[test]
    fn test_decode_binary_event_skips_attachment_count() {
        let packet = V1Codec::decode(r#"451-/chat,["file",{"_placeholder":true,"num":0}]"#).unwrap();
        assert_eq!(packet.inner, Some(SocketPacket::BinaryEvent));
        assert_eq!(packet.namespace, "/chat");
        assert!(packet.data.starts_with(r#"["file""#));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(V1Codec::decode("").is_err());
        assert!(V1Codec::decode("b4AAAA").is_err());
        assert!(V1Codec::decode("9").is_err());
        assert!(V1Codec::decode("49").is_err());
    }

    #[test]
    fn test_normalize_namespace() {
        assert_eq!(normalize_namespace(""), "");
        assert_eq!(normalize_namespace("/"), "");
        assert_eq!(normalize_namespace("chat"), "/chat");
        assert_eq!(normalize_namespace("/chat"), "/chat");
        assert_eq!(normalize_namespace(" /chat "), "/chat");
    }
}
