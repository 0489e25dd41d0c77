//! Server URL parsing.
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::engine::ServerUrl;
//!
//! let url = ServerUrl::parse("https://example.com/realtime?token=abc").unwrap();
//! assert!(url.is_secured());
//! assert_eq!(url.port(), 443);
//! assert_eq!(url.path(), "realtime");
//! assert_eq!(url.host_header(), "example.com");
//! ```

use url::Url;

use crate::error::{Result, SocketIoError};

/// Default Socket.IO mount path.
pub const DEFAULT_PATH: &str = "socket.io";

/// Default host when the URL names none.
pub const DEFAULT_HOST: &str = "localhost";

/// Location of a Socket.IO server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl {
    secured: bool,
    host: String,
    port: u16,
    path: String,
    query: Vec<(String, String)>,
}

impl ServerUrl {
    /// Parse `http`, `https`, `ws` or `wss` URLs.
    ///
    /// A URL without a scheme is read as `http`.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = if raw.contains("://") {
            Url::parse(raw)
        } else {
            Url::parse(&format!("http://{}", raw))
        }
        .map_err(|e| SocketIoError::MalformedUrl(format!("{}: {}", raw, e)))?;

        let secured = match url.scheme() {
            "http" | "ws" => false,
            "https" | "wss" => true,
            other => {
                return Err(SocketIoError::MalformedUrl(format!(
                    "{}: unsupported scheme {:?}",
                    raw, other
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_HOST)
            .to_string();
        let port = url.port().unwrap_or(if secured { 443 } else { 80 });

        let trimmed = url.path().trim_matches('/');
        let path = if trimmed.is_empty() {
            DEFAULT_PATH.to_string()
        } else {
            trimmed.to_string()
        };

        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            secured,
            host,
            port,
            path,
            query,
        })
    }

    /// Whether the connection is wrapped in TLS.
    #[inline]
    pub fn is_secured(&self) -> bool {
        self.secured
    }

    /// Host name or address.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Mount path without leading or trailing slashes.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters carried by the URL, in order.
    #[inline]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Value of the `Host` header: the port is omitted when it is the
    /// scheme's default.
    pub fn host_header(&self) -> String {
        let default_port = if self.secured { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `http(s)://host:port/path`, used for the handshake request.
    pub fn http_base(&self) -> String {
        format!(
            "{}://{}:{}/{}",
            if self.secured { "https" } else { "http" },
            self.host,
            self.port,
            self.path
        )
    }

    /// Encode `params` followed by the URL's own query parameters.
    ///
    /// A URL parameter whose key is already in `params` replaces that value
    /// in place; other URL parameters are appended.
    pub fn merged_query(&self, params: &[(&str, String)]) -> String {
        let mut merged: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        for (key, value) in &self.query {
            match merged.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => merged.push((key.clone(), value.clone())),
            }
        }

        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(merged)
            .finish()
    }

    /// The URL's own query string, if it has one.
    pub fn own_query(&self) -> Option<String> {
        if self.query.is_empty() {
            None
        } else {
            Some(self.merged_query(&[]))
        }
    }
}
