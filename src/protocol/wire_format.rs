//! WebSocket frame header layout (RFC 6455 §5.2).
//!
//! ```text
//! ┌───┬──────┬────────┬──────┬──────────┬────────────────┬──────────┐
//! │FIN│ RSV  │ Opcode │ MASK │ Len (7)  │ Ext. length    │ Mask key │
//! │ 1 │ 3    │ 4 bits │ 1    │ 0..=127  │ 0, 2 or 8 bytes│ 0 or 4   │
//! └───┴──────┴────────┴──────┴──────────┴────────────────┴──────────┘
//! ```
//!
//! Extended lengths are Big Endian. A 7-bit length of 126 announces a
//! 16-bit extension, 127 announces a 64-bit extension.

use bytes::{BufMut, BytesMut};

use crate::error::{Result, SocketIoError};

/// Size of the fixed part of every frame header.
pub const BASE_HEADER_SIZE: usize = 2;

/// Size of a mask key.
pub const MASK_KEY_SIZE: usize = 4;

/// Largest payload length that fits in the 7-bit field.
pub const MAX_SHORT_LENGTH: u64 = 125;

/// Largest payload length that fits in the 16-bit extension.
pub const MAX_MEDIUM_LENGTH: u64 = 0xFFFF;

/// 7-bit length marker announcing a 16-bit extended length.
pub const LENGTH_MARKER_16: u8 = 126;

/// 7-bit length marker announcing a 64-bit extended length.
pub const LENGTH_MARKER_64: u8 = 127;

/// Bit masks for the two base header bytes.
pub mod bits {
    /// Byte 0: final fragment.
    pub const FIN: u8 = 0b1000_0000;
    /// Byte 0: reserved bit 1.
    pub const RSV1: u8 = 0b0100_0000;
    /// Byte 0: reserved bit 2.
    pub const RSV2: u8 = 0b0010_0000;
    /// Byte 0: reserved bit 3.
    pub const RSV3: u8 = 0b0001_0000;
    /// Byte 0: opcode nibble.
    pub const OPCODE: u8 = 0b0000_1111;
    /// Byte 1: payload is masked.
    pub const MASK: u8 = 0b1000_0000;
    /// Byte 1: 7-bit payload length.
    pub const LENGTH: u8 = 0b0111_1111;
}

/// Frame opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Continuation of a fragmented message.
    Continuation,
    /// UTF-8 text.
    Text,
    /// Binary data.
    Binary,
    /// Connection close.
    Close,
    /// Ping.
    Ping,
    /// Pong.
    Pong,
    /// One of the reserved opcodes (0x3-0x7, 0xB-0xF).
    Reserved(u8),
}

impl OpCode {
    /// Build an opcode from the low nibble of `value`.
    pub fn from_u8(value: u8) -> Self {
        match value & bits::OPCODE {
            0x0 => OpCode::Continuation,
            0x1 => OpCode::Text,
            0x2 => OpCode::Binary,
            0x8 => OpCode::Close,
            0x9 => OpCode::Ping,
            0xA => OpCode::Pong,
            other => OpCode::Reserved(other),
        }
    }

    /// Wire value of the opcode.
    pub fn as_u8(self) -> u8 {
        match self {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
            OpCode::Reserved(value) => value & bits::OPCODE,
        }
    }

    /// Control frames have the high bit of the opcode set.
    #[inline]
    pub fn is_control(self) -> bool {
        self.as_u8() & 0x8 != 0
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Final fragment flag. Always set on frames this crate produces.
    pub fin: bool,
    /// RSV1, RSV2, RSV3.
    pub rsv: [bool; 3],
    /// Frame opcode.
    pub opcode: OpCode,
    /// Mask key, present iff the MASK bit is set.
    pub mask_key: Option<[u8; MASK_KEY_SIZE]>,
    /// Payload length in bytes.
    pub payload_length: u64,
}

impl Header {
    /// Create a single-frame header (FIN set, RSV clear).
    pub fn new(opcode: OpCode, mask_key: Option<[u8; MASK_KEY_SIZE]>, payload_length: u64) -> Self {
        Self {
            fin: true,
            rsv: [false; 3],
            opcode,
            mask_key,
            payload_length,
        }
    }

    /// Whether the MASK bit is set.
    #[inline]
    pub fn is_masked(&self) -> bool {
        self.mask_key.is_some()
    }

    /// Number of bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let mask = if self.is_masked() { MASK_KEY_SIZE } else { 0 };
        BASE_HEADER_SIZE + extended_length_size(length_marker(self.payload_length)) + mask
    }

    /// Append the header (including extended length and mask key) to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        let mut first = self.opcode.as_u8() & bits::OPCODE;
        if self.fin {
            first |= bits::FIN;
        }
        for (flag, bit) in self.rsv.iter().zip([bits::RSV1, bits::RSV2, bits::RSV3]) {
            if *flag {
                first |= bit;
            }
        }

        let marker = length_marker(self.payload_length);
        let mut second = marker;
        if self.is_masked() {
            second |= bits::MASK;
        }

        buf.put_u8(first);
        buf.put_u8(second);

        match marker {
            LENGTH_MARKER_16 => buf.put_u16(self.payload_length as u16),
            LENGTH_MARKER_64 => buf.put_u64(self.payload_length),
            _ => {}
        }

        if let Some(key) = self.mask_key {
            buf.put_slice(&key);
        }
    }
}

/// Fields carried by the two base header bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseHeader {
    /// FIN bit.
    pub fin: bool,
    /// RSV1..3.
    pub rsv: [bool; 3],
    /// Opcode nibble.
    pub opcode: OpCode,
    /// MASK bit.
    pub mask: bool,
    /// Raw 7-bit length field.
    pub length_field: u8,
}

/// Split the two base header bytes into their fields.
pub fn parse_base_header(first: u8, second: u8) -> BaseHeader {
    BaseHeader {
        fin: first & bits::FIN != 0,
        rsv: [
            first & bits::RSV1 != 0,
            first & bits::RSV2 != 0,
            first & bits::RSV3 != 0,
        ],
        opcode: OpCode::from_u8(first),
        mask: second & bits::MASK != 0,
        length_field: second & bits::LENGTH,
    }
}

/// The 7-bit length value that announces `length`.
#[inline]
pub fn length_marker(length: u64) -> u8 {
    if length > MAX_MEDIUM_LENGTH {
        LENGTH_MARKER_64
    } else if length > MAX_SHORT_LENGTH {
        LENGTH_MARKER_16
    } else {
        length as u8
    }
}

/// Number of extended-length bytes following a given 7-bit length field.
#[inline]
pub fn extended_length_size(length_field: u8) -> usize {
    match length_field {
        LENGTH_MARKER_16 => 2,
        LENGTH_MARKER_64 => 8,
        _ => 0,
    }
}

/// Resolve the payload length from the 7-bit field and its extension bytes.
///
/// `extension` must hold exactly [`extended_length_size`] bytes.
pub fn decode_length(length_field: u8, extension: &[u8]) -> Result<u64> {
    let expected = extended_length_size(length_field);
    if extension.len() < expected {
        return Err(SocketIoError::FrameDecode(format!(
            "truncated extended length: need {} bytes, have {}",
            expected,
            extension.len()
        )));
    }

    Ok(match length_field {
        LENGTH_MARKER_16 => u16::from_be_bytes([extension[0], extension[1]]) as u64,
        LENGTH_MARKER_64 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&extension[..8]);
            u64::from_be_bytes(raw)
        }
        short => short as u64,
    })
}

/// Convert a wire length to an in-memory size.
///
/// Fails instead of truncating when the platform cannot address it.
pub fn payload_size(length: u64) -> Result<usize> {
    usize::try_from(length).map_err(|_| {
        SocketIoError::FrameDecode(format!(
            "payload length {} is not addressable on this architecture",
            length
        ))
    })
}
