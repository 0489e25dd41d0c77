//! WebSocket upgrade request and response.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{Result, SocketIoError};

/// Status line prefix of a successful upgrade.
pub const SWITCHING_PROTOCOLS: &str = "HTTP/1.1 101";

/// Longest status or header line accepted in the upgrade response.
pub const MAX_HEADER_LINE: usize = 8 * 1024;

/// Fresh `Sec-WebSocket-Key`: 16 random bytes, base64 encoded.
pub fn generate_key() -> String {
    BASE64_STANDARD.encode(rand::random::<[u8; 16]>())
}

/// `GET ... HTTP/1.1` request switching the socket to WebSocket.
#[derive(Debug, Clone)]
pub struct UpgradeRequest<'a> {
    /// Request target, e.g. `/socket.io/?EIO=3&transport=websocket&sid=...`.
    pub path: &'a str,
    /// `Host` header value.
    pub host: &'a str,
    /// `Sec-WebSocket-Key` value.
    pub key: &'a str,
    /// `Cookie` header value.
    pub cookie: Option<&'a str>,
    /// Extra headers, written after the cookie.
    pub headers: &'a [(String, String)],
}

impl UpgradeRequest<'_> {
    /// Serialize the request, terminated by an empty line.
    pub fn to_http(&self) -> String {
        let mut out = format!(
            "GET {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Upgrade: WebSocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {}\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Origin: *\r\n",
            self.path, self.host, self.key
        );

        if let Some(cookie) = self.cookie {
            out.push_str(&format!("Cookie: {}\r\n", cookie));
        }
        for (name, value) in self.headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str("\r\n");
        out
    }
}

/// Read the upgrade response: check the status line, then drain headers up
/// to the blank line.
///
/// Anything but `HTTP/1.1 101` is a [`SocketIoError::ProtocolViolation`].
pub async fn read_upgrade_response<R>(reader: &mut R) -> Result<()>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut line = String::new();
    read_header_line(reader, &mut line).await?;

    if !line.starts_with(SWITCHING_PROTOCOLS) {
        return Err(SocketIoError::ProtocolViolation(format!(
            "expected \"{}\", had {:?}",
            SWITCHING_PROTOCOLS,
            line.trim_end()
        )));
    }

    loop {
        line.clear();
        let n = read_header_line(reader, &mut line).await?;
        if n == 0 || line.trim().is_empty() {
            return Ok(());
        }
    }
}

/// Read one line of at most [`MAX_HEADER_LINE`] bytes.
async fn read_header_line<R>(reader: &mut R, line: &mut String) -> Result<usize>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let n = (&mut *reader)
        .take(MAX_HEADER_LINE as u64 + 1)
        .read_line(line)
        .await?;

    if n > MAX_HEADER_LINE && !line.ends_with('\n') {
        return Err(SocketIoError::ProtocolViolation(format!(
            "upgrade response line longer than {} bytes",
            MAX_HEADER_LINE
        )));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, BufReader};

    #[test]
    fn test_generate_key() {
        let key = generate_key();
        assert_eq!(key.len(), 24);
        assert_eq!(BASE64_STANDARD.decode(&key).unwrap().len(), 16);
        assert_ne!(key, generate_key());
    }

    #[test]
    fn test_request_layout() {
        let request = UpgradeRequest {
            path: "/socket.io/?sid=abc&EIO=3&use_b64=0&transport=websocket",
            host: "localhost:3000",
            key: "dGhlIHNhbXBsZSBub25jZQ==",
            cookie: None,
            headers: &[],
        };

        assert_eq!(
            request.to_http(),
            "GET /socket.io/?sid=abc&EIO=3&use_b64=0&transport=websocket HTTP/1.1\r\n\
             Host: localhost:3000\r\n\
             Upgrade: WebSocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Origin: *\r\n\
             \r\n"
        );
    }

    #[test]
    fn test_request_cookie_before_custom_headers() {
        let headers = vec![("X-Token".to_string(), "secret".to_string())];
        let request = UpgradeRequest {
            path: "/",
            host: "h",
            key: "k",
            cookie: Some("io=abc"),
            headers: &headers,
        };

        let http = request.to_http();
        assert!(http.ends_with("Origin: *\r\nCookie: io=abc\r\nX-Token: secret\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_accepts_switching_protocols_and_keeps_trailing_bytes() {
        let raw: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\n\
                           Upgrade: websocket\r\n\
                           Connection: Upgrade\r\n\
                           \r\n\
                           \x81\x013";
        let mut reader = BufReader::new(raw);
        read_upgrade_response(&mut reader).await.unwrap();

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"\x81\x013");
    }

    #[tokio::test]
    async fn test_rejects_other_status() {
        let raw: &[u8] = b"HTTP/1.1 400 Bad Request\r\n\r\n";
        let mut reader = BufReader::new(raw);
        let err = read_upgrade_response(&mut reader).await.unwrap_err();
        match err {
            SocketIoError::ProtocolViolation(msg) => assert!(msg.contains("400 Bad Request")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejects_empty_response() {
        let raw: &[u8] = b"";
        let mut reader = BufReader::new(raw);
        assert!(read_upgrade_response(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_unterminated_header_line() {
        let mut raw = b"HTTP/1.1 101 Switching Protocols\r\nX-Junk: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_HEADER_LINE * 2));
        let mut reader = BufReader::new(raw.as_slice());

        assert!(matches!(
            read_upgrade_response(&mut reader).await,
            Err(SocketIoError::ProtocolViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_accepts_line_at_limit() {
        let mut raw = b"HTTP/1.1 101 Switching Protocols\r\n".to_vec();
        let header = format!("X-Pad: {}\r\n", "a".repeat(MAX_HEADER_LINE - 9));
        assert_eq!(header.len(), MAX_HEADER_LINE);
        raw.extend_from_slice(header.as_bytes());
        raw.extend_from_slice(b"\r\n");
        let mut reader = BufReader::new(raw.as_slice());

        read_upgrade_response(&mut reader).await.unwrap();
    }
}
