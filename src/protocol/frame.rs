//! Single WebSocket frame: build, parse and mask.
//!
//! Fragmentation is not supported: every frame built here has FIN set,
//! and parsed frames are treated as complete messages.
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::protocol::{Frame, OpCode};
//!
//! let bytes = Frame::encode(b"foo", OpCode::Text, false);
//! assert_eq!(&bytes[..], &[0x81, 0x03, b'f', b'o', b'o']);
//!
//! let frame = Frame::decode(&bytes).unwrap();
//! assert_eq!(frame.opcode(), OpCode::Text);
//! assert_eq!(frame.payload(), b"foo");
//! ```

use std::borrow::Cow;

use bytes::{Bytes, BytesMut};

use super::wire_format::{
    decode_length, extended_length_size, parse_base_header, payload_size, Header, OpCode,
    BASE_HEADER_SIZE, MASK_KEY_SIZE,
};
use crate::error::{Result, SocketIoError};

/// A decoded frame. The payload is always stored unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Unmasked payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame from a header and an unmasked payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Encode `payload` as a single frame.
    ///
    /// When `mask` is true a fresh random mask key is generated.
    pub fn encode(payload: &[u8], opcode: OpCode, mask: bool) -> Bytes {
        let key = if mask { Some(generate_mask_key()) } else { None };
        Self::encode_with_key(payload, opcode, key)
    }

    /// Encode `payload` with an explicit mask key (or none).
    pub fn encode_with_key(payload: &[u8], opcode: OpCode, mask_key: Option<[u8; 4]>) -> Bytes {
        let header = Header::new(opcode, mask_key, payload.len() as u64);
        let mut buf = BytesMut::with_capacity(header.encoded_len() + payload.len());
        header.encode_into(&mut buf);

        let start = buf.len();
        buf.extend_from_slice(payload);
        if let Some(key) = mask_key {
            apply_mask(&mut buf[start..], key);
        }

        buf.freeze()
    }

    /// Parse one frame from a byte slice.
    ///
    /// If fewer payload bytes are present than announced, the available
    /// bytes are returned (the peer closed early). A slice shorter than the
    /// header itself is an error.
    pub fn decode(buf: &[u8]) -> Result<Frame> {
        if buf.len() < BASE_HEADER_SIZE {
            return Err(SocketIoError::FrameDecode(format!(
                "need at least {} bytes, have {}",
                BASE_HEADER_SIZE,
                buf.len()
            )));
        }

        let base = parse_base_header(buf[0], buf[1]);
        let mut offset = BASE_HEADER_SIZE;

        let ext = extended_length_size(base.length_field);
        let extension = buf.get(offset..offset + ext).ok_or_else(|| {
            SocketIoError::FrameDecode("truncated extended length".to_string())
        })?;
        let length = decode_length(base.length_field, extension)?;
        offset += ext;

        let mask_key = if base.mask {
            let raw = buf
                .get(offset..offset + MASK_KEY_SIZE)
                .ok_or_else(|| SocketIoError::FrameDecode("truncated mask key".to_string()))?;
            offset += MASK_KEY_SIZE;
            let mut key = [0u8; MASK_KEY_SIZE];
            key.copy_from_slice(raw);
            Some(key)
        } else {
            None
        };

        let wanted = payload_size(length)?;
        let end = offset.saturating_add(wanted).min(buf.len());
        let mut payload = BytesMut::from(&buf[offset..end]);
        if let Some(key) = mask_key {
            apply_mask(&mut payload, key);
        }

        let header = Header {
            fin: base.fin,
            rsv: base.rsv,
            opcode: base.opcode,
            mask_key,
            payload_length: length,
        };

        Ok(Frame::new(header, payload.freeze()))
    }

    /// Get the unmasked payload.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Payload as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Get the opcode.
    #[inline]
    pub fn opcode(&self) -> OpCode {
        self.header.opcode
    }

    /// FIN bit.
    #[inline]
    pub fn fin(&self) -> bool {
        self.header.fin
    }

    /// RSV1..3 bits.
    #[inline]
    pub fn rsv(&self) -> [bool; 3] {
        self.header.rsv
    }

    /// Whether the frame arrived masked.
    #[inline]
    pub fn is_masked(&self) -> bool {
        self.header.is_masked()
    }

    /// Mask key the frame arrived with.
    #[inline]
    pub fn mask_key(&self) -> Option<[u8; 4]> {
        self.header.mask_key
    }
}

/// XOR `data` in place with the repeating 4-byte `key`.
pub fn apply_mask(data: &mut [u8], key: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

/// Return `data` XORed with the repeating 4-byte `key`.
///
/// Masking is an involution: applying it twice yields the input.
pub fn mask_data(data: &[u8], key: [u8; 4]) -> Vec<u8> {
    let mut out = data.to_vec();
    apply_mask(&mut out, key);
    out
}

/// Fresh mask key from the thread-local CSPRNG.
pub fn generate_mask_key() -> [u8; 4] {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::LENGTH_MARKER_64;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_encode_unmasked_text() {
        let bytes = Frame::encode(b"foo", OpCode::Text, false);
        assert_eq!(hex(&bytes), "8103666f6f");
    }

    #[test]
    fn test_encode_masked_with_known_key() {
        let bytes = Frame::encode_with_key(b"foo", OpCode::Text, Some(*b"?EV!"));
        assert_eq!(hex(&bytes), "81833f455621592a39");
    }

    #[test]
    fn test_encode_masked_random_key_roundtrip() {
        let bytes = Frame::encode(b"hello world", OpCode::Text, true);
        assert_eq!(bytes[1] & 0x80, 0x80);
        assert_eq!(bytes.len(), 2 + 4 + 11);

        let frame = Frame::decode(&bytes).unwrap();
        assert!(frame.is_masked());
        assert_eq!(frame.payload(), b"hello world");
    }

    #[test]
    fn test_decode_known_vector() {
        let frame = Frame::decode(&[0x81, 0x03, b'f', b'o', b'o']).unwrap();
        assert!(frame.fin());
        assert!(!frame.is_masked());
        assert_eq!(frame.opcode(), OpCode::Text);
        assert_eq!(frame.payload(), b"foo");
        assert_eq!(frame.text(), "foo");
    }

    #[test]
    fn test_decode_masked_vector() {
        let frame =
            Frame::decode(&[0x81, 0x83, 0x3f, 0x45, 0x56, 0x21, 0x59, 0x2a, 0x39]).unwrap();
        assert_eq!(frame.mask_key(), Some(*b"?EV!"));
        assert_eq!(frame.payload(), b"foo");
    }

    #[test]
    fn test_length_125_uses_short_field() {
        let payload = vec![b'a'; 125];
        let bytes = Frame::encode(&payload, OpCode::Text, false);
        assert_eq!(bytes[1], 125);
        assert_eq!(bytes.len(), 2 + 125);
    }

    #[test]
    fn test_length_126_uses_16_bit_field() {
        let payload = vec![b'a'; 126];
        let bytes = Frame::encode(&payload, OpCode::Text, false);
        assert_eq!(bytes[1], 126);
        assert_eq!(&bytes[2..4], &[0x00, 126]);
        assert_eq!(bytes.len(), 4 + 126);
    }

    #[test]
    fn test_length_130_marker_and_value() {
        let payload = vec![b'x'; 130];
        let bytes = Frame::encode(&payload, OpCode::Text, false);
        assert_eq!(bytes[1], 126);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 130);
        assert_eq!(Frame::decode(&bytes).unwrap().payload_len(), 130);
    }

    #[test]
    fn test_length_65536_uses_64_bit_field() {
        let payload = vec![0xAB; 65536];
        let bytes = Frame::encode(&payload, OpCode::Binary, false);
        assert_eq!(bytes[1], LENGTH_MARKER_64);
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[2..10]);
        assert_eq!(u64::from_be_bytes(raw), 65536);

        let frame = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.payload_len(), 65536);
        assert!(frame.payload().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_roundtrip_across_opcodes() {
        let payloads: [&[u8]; 4] = [b"", b"x", b"socket.io", &[0u8, 255, 7, 128]];
        let opcodes = [
            OpCode::Text,
            OpCode::Binary,
            OpCode::Close,
            OpCode::Ping,
            OpCode::Pong,
        ];
        for payload in payloads {
            for opcode in opcodes {
                let frame = Frame::decode(&Frame::encode(payload, opcode, false)).unwrap();
                assert_eq!(frame.payload(), payload);
                assert_eq!(frame.opcode(), opcode);
            }
        }
    }

    #[test]
    fn test_decode_too_short() {
        assert!(Frame::decode(&[]).is_err());
        let err = Frame::decode(&[0x81]).unwrap_err();
        assert!(matches!(err, SocketIoError::FrameDecode(_)));
    }

    #[test]
    fn test_decode_truncated_extended_length() {
        let err = Frame::decode(&[0x81, 126, 0x00]).unwrap_err();
        assert!(err.to_string().contains("truncated extended length"));
        assert!(Frame::decode(&[0x81, 127, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_decode_truncated_mask_key() {
        let err = Frame::decode(&[0x81, 0x83, 0x01, 0x02]).unwrap_err();
        assert!(err.to_string().contains("truncated mask key"));
    }

    #[test]
    fn test_decode_short_payload_returns_available_bytes() {
        let frame = Frame::decode(&[0x81, 0x05, b'a', b'b']).unwrap();
        assert_eq!(frame.header.payload_length, 5);
        assert_eq!(frame.payload(), b"ab");
    }

    #[test]
    fn test_mask_is_involution() {
        let key = [0x12, 0x34, 0x56, 0x78];
        let data: Vec<u8> = (0..=255).collect();
        let masked = mask_data(&data, key);
        assert_ne!(masked, data);
        assert_eq!(mask_data(&masked, key), data);
    }

    #[test]
    fn test_mask_key_repeats_every_four_bytes() {
        let masked = mask_data(&[0u8; 9], [1, 2, 3, 4]);
        assert_eq!(masked, vec![1, 2, 3, 4, 1, 2, 3, 4, 1]);
    }

    #[test]
    fn test_generated_mask_keys_differ() {
        let keys: Vec<[u8; 4]> = (0..8).map(|_| generate_mask_key()).collect();
        assert!(keys.windows(2).any(|w| w[0] != w[1]));
    }
}
