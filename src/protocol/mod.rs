//! Protocol module - WebSocket framing (RFC 6455 §5.2).
//!
//! This module implements the frame layer under Engine.IO:
//! - Base header and extended length encoding/decoding
//! - Frame struct with typed accessors and masking
//! - Async frame reader for socket streams

mod frame;
mod reader;
mod wire_format;

pub use frame::{apply_mask, generate_mask_key, mask_data, Frame};
pub use reader::read_frame;
pub use wire_format::{
    bits, decode_length, extended_length_size, length_marker, parse_base_header, payload_size,
    BaseHeader, Header, OpCode, BASE_HEADER_SIZE, LENGTH_MARKER_16, LENGTH_MARKER_64,
    MASK_KEY_SIZE, MAX_MEDIUM_LENGTH, MAX_SHORT_LENGTH,
};
