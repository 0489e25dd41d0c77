//! Packet type numbering for each protocol generation.

use crate::error::{Result, SocketIoError};

/// Socket.IO protocol generation spoken by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// Socket.IO 0.x (colon-delimited packets).
    V0,
    /// Socket.IO 1.x (Engine.IO 2).
    V1,
    /// Socket.IO 2.x (Engine.IO 3).
    V2,
}

impl ProtocolVersion {
    /// Human readable engine name.
    pub fn name(self) -> &'static str {
        match self {
            ProtocolVersion::V0 => "SocketIO Version 0.X",
            ProtocolVersion::V1 => "SocketIO Version 1.X",
            ProtocolVersion::V2 => "SocketIO Version 2.X",
        }
    }

    /// Highest valid transport-layer packet code.
    pub fn max_packet_code(self) -> u8 {
        match self {
            ProtocolVersion::V0 => 8,
            ProtocolVersion::V1 | ProtocolVersion::V2 => 6,
        }
    }

    /// Protocol number sent during the handshake when none is configured.
    ///
    /// For 0.x this is the path segment, for 1.x/2.x the `EIO` parameter.
    pub fn default_protocol(self) -> u8 {
        match self {
            ProtocolVersion::V0 => 1,
            ProtocolVersion::V1 => 2,
            ProtocolVersion::V2 => 3,
        }
    }

    /// Whether this generation uses the colon-delimited grammar.
    #[inline]
    pub fn is_legacy(self) -> bool {
        self == ProtocolVersion::V0
    }
}

/// Transport-layer packet kind.
///
/// 0.x and 1.x/2.x number these differently and each has kinds the other
/// lacks; use [`TransportPacket::code`] and [`TransportPacket::from_code`]
/// with the engine's version.
///
/// | Kind          | 0.x | 1.x/2.x |
/// |---------------|-----|---------|
/// | `Close`       | 0 (DISCONNECT) | 1 |
/// | `Open`        | 1 (CONNECT)    | 0 |
/// | `Ping`        | 2 (HEARTBEAT)  | 2 |
/// | `Pong`        | -   | 3 |
/// | `Message`     | 3   | 4 |
/// | `JsonMessage` | 4   | - |
/// | `Event`       | 5   | - |
/// | `Ack`         | 6   | - |
/// | `Error`       | 7   | - |
/// | `Upgrade`     | -   | 5 |
/// | `Noop`        | 8   | 6 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportPacket {
    /// DISCONNECT (0.x) / CLOSE (1.x).
    Close,
    /// CONNECT (0.x) / OPEN (1.x).
    Open,
    /// HEARTBEAT (0.x) / PING (1.x).
    Ping,
    /// PONG (1.x only).
    Pong,
    /// MESSAGE.
    Message,
    /// JSON_MESSAGE (0.x only).
    JsonMessage,
    /// EVENT (0.x only).
    Event,
    /// ACK (0.x only).
    Ack,
    /// ERROR (0.x only).
    Error,
    /// UPGRADE (1.x only).
    Upgrade,
    /// NOOP.
    Noop,
}

impl TransportPacket {
    /// Wire code for this kind, or `None` if `version` has no such packet.
    pub fn code(self, version: ProtocolVersion) -> Option<u8> {
        use TransportPacket::*;

        match version {
            ProtocolVersion::V0 => match self {
                Close => Some(0),
                Open => Some(1),
                Ping => Some(2),
                Message => Some(3),
                JsonMessage => Some(4),
                Event => Some(5),
                Ack => Some(6),
                Error => Some(7),
                Noop => Some(8),
                Pong | Upgrade => None,
            },
            ProtocolVersion::V1 | ProtocolVersion::V2 => match self {
                Open => Some(0),
                Close => Some(1),
                Ping => Some(2),
                Pong => Some(3),
                Message => Some(4),
                Upgrade => Some(5),
                Noop => Some(6),
                JsonMessage | Event | Ack | Error => None,
            },
        }
    }

    /// Kind for a wire code.
    ///
    /// Codes above the version's maximum are an [`SocketIoError::InvalidArgument`].
    pub fn from_code(code: u8, version: ProtocolVersion) -> Result<Self> {
        use TransportPacket::*;

        let kind = match version {
            ProtocolVersion::V0 => match code {
                0 => Close,
                1 => Open,
                2 => Ping,
                3 => Message,
                4 => JsonMessage,
                5 => Event,
                6 => Ack,
                7 => Error,
                8 => Noop,
                _ => return Err(invalid_code(code, version)),
            },
            ProtocolVersion::V1 | ProtocolVersion::V2 => match code {
                0 => Open,
                1 => Close,
                2 => Ping,
                3 => Pong,
                4 => Message,
                5 => Upgrade,
                6 => Noop,
                _ => return Err(invalid_code(code, version)),
            },
        };

        Ok(kind)
    }
}

fn invalid_code(code: u8, version: ProtocolVersion) -> SocketIoError {
    SocketIoError::InvalidArgument(format!(
        "packet type {} is out of range 0..={} for {}",
        code,
        version.max_packet_code(),
        version.name()
    ))
}

/// Socket.IO packet kind carried inside a 1.x/2.x MESSAGE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketPacket {
    /// Join a namespace.
    Connect,
    /// Leave a namespace.
    Disconnect,
    /// Named event.
    Event,
    /// Acknowledgement.
    Ack,
    /// Error.
    Error,
    /// Event with binary attachments.
    BinaryEvent,
    /// Acknowledgement with binary attachments.
    BinaryAck,
}

impl SocketPacket {
    /// Wire code.
    pub fn code(self) -> u8 {
        match self {
            SocketPacket::Connect => 0,
            SocketPacket::Disconnect => 1,
            SocketPacket::Event => 2,
            SocketPacket::Ack => 3,
            SocketPacket::Error => 4,
            SocketPacket::BinaryEvent => 5,
            SocketPacket::BinaryAck => 6,
        }
    }

    /// Kind for a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => SocketPacket::Connect,
            1 => SocketPacket::Disconnect,
            2 => SocketPacket::Event,
            3 => SocketPacket::Ack,
            4 => SocketPacket::Error,
            5 => SocketPacket::BinaryEvent,
            6 => SocketPacket::BinaryAck,
            _ => return None,
        })
    }

    /// Binary kinds carry an attachment count and out-of-band buffers.
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(self, SocketPacket::BinaryEvent | SocketPacket::BinaryAck)
    }
}
