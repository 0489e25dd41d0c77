//! Read one frame from an async byte stream.
//!
//! The header is read field by field; the payload is read until the
//! announced length is satisfied or the peer closes, since a single socket
//! read may return fewer bytes than requested.

use std::io::ErrorKind;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::frame::{apply_mask, Frame};
use super::wire_format::{
    decode_length, extended_length_size, parse_base_header, payload_size, Header, MASK_KEY_SIZE,
};
use crate::error::{Result, SocketIoError};

/// Read exactly one frame from `reader`.
///
/// Returns [`SocketIoError::ConnectionClosed`] if the stream ends before
/// the first byte, and [`SocketIoError::FrameDecode`] if it ends inside the
/// header.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let first = match reader.read_u8().await {
        Ok(byte) => byte,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(SocketIoError::ConnectionClosed),
        Err(e) => return Err(e.into()),
    };
    let second = read_header_part(reader.read_u8().await, "length byte")?;

    let base = parse_base_header(first, second);

    let mut extension = [0u8; 8];
    let ext = extended_length_size(base.length_field);
    if ext > 0 {
        read_header_part(
            reader.read_exact(&mut extension[..ext]).await,
            "extended length",
        )?;
    }
    let length = decode_length(base.length_field, &extension[..ext])?;

    let mask_key = if base.mask {
        let mut key = [0u8; MASK_KEY_SIZE];
        read_header_part(reader.read_exact(&mut key).await, "mask key")?;
        Some(key)
    } else {
        None
    };

    let wanted = payload_size(length)?;
    let mut payload = Vec::with_capacity(wanted.min(64 * 1024));
    let read = (&mut *reader).take(length).read_to_end(&mut payload).await?;
    if read < wanted {
        tracing::debug!(expected = wanted, read, "peer closed before full payload arrived");
    }

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

    Ok(Frame::new(header, Bytes::from(payload)))
}

fn read_header_part<T>(result: std::io::Result<T>, what: &str) -> Result<T> {
    result.map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            SocketIoError::FrameDecode(format!("truncated frame: missing {}", what))
        } else {
            SocketIoError::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OpCode;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_read_simple_frame() {
        let bytes = Frame::encode(b"foo", OpCode::Text, false);
        let mut reader = &bytes[..];
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame.payload(), b"foo");
        assert_eq!(frame.opcode(), OpCode::Text);
    }

    #[tokio::test]
    async fn test_read_masked_frame() {
        let bytes = Frame::encode_with_key(b"foo", OpCode::Text, Some(*b"?EV!"));
        let mut reader = &bytes[..];
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame.mask_key(), Some(*b"?EV!"));
        assert_eq!(frame.payload(), b"foo");
    }

    #[tokio::test]
    async fn test_read_consecutive_frames() {
        let mut data = Frame::encode(b"first", OpCode::Text, false).to_vec();
        data.extend_from_slice(&Frame::encode(b"second", OpCode::Text, true));
        let mut reader = &data[..];

        assert_eq!(read_frame(&mut reader).await.unwrap().payload(), b"first");
        assert_eq!(read_frame(&mut reader).await.unwrap().payload(), b"second");
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(SocketIoError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_read_large_frame_in_small_chunks() {
        let payload = vec![b'z'; 70_000];
        let bytes = Frame::encode(&payload, OpCode::Text, true);

        let (mut client, mut server) = tokio::io::duplex(1024);
        let writer = tokio::spawn(async move {
            for chunk in bytes.chunks(777) {
                server.write_all(chunk).await.unwrap();
            }
        });

        let frame = read_frame(&mut client).await.unwrap();
        writer.await.unwrap();
        assert_eq!(frame.payload_len(), 70_000);
        assert!(frame.payload().iter().all(|&b| b == b'z'));
    }

    #[tokio::test]
    async fn test_truncated_header_is_decode_error() {
        let mut reader: &[u8] = &[0x81];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, SocketIoError::FrameDecode(_)));

        let mut reader: &[u8] = &[0x81, 126, 0x01];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("extended length"));

        let mut reader: &[u8] = &[0x81, 0x81, 1, 2];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(err.to_string().contains("mask key"));
    }

    #[tokio::test]
    async fn test_peer_close_mid_payload_returns_partial() {
        let mut reader: &[u8] = &[0x81, 0x05, b'a', b'b', b'c'];
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame.payload(), b"abc");
    }
}
