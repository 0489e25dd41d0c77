//! Handshake GET over `reqwest`.

use reqwest::header::SET_COOKIE;

use crate::engine::EngineOptions;
use crate::error::{Result, SocketIoError};

/// Body and cookies returned by the handshake request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// Raw response body.
    pub body: String,
    /// `name=value` pairs from `Set-Cookie` headers.
    pub cookies: Vec<String>,
}

/// Perform the handshake GET against `url`.
///
/// Network failures, timeouts and non-2xx answers are all reported as
/// [`SocketIoError::ServerConnectionFailure`].
pub async fn fetch(url: &str, options: &EngineOptions) -> Result<HandshakeResponse> {
    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        // The upgrade connects straight to the server, so the handshake must too.
        .no_proxy()
        .danger_accept_invalid_certs(!options.tls_verify)
        .build()?;

    let mut request = client.get(url);
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    tracing::debug!(%url, "handshake request");
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SocketIoError::ServerConnectionFailure(format!(
            "handshake with {} answered {}",
            url, status
        )));
    }

    let cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    let body = response.text().await?;

    Ok(HandshakeResponse { body, cookies })
}
