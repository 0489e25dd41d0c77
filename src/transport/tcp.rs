//! TCP connect with optional TLS.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;

use super::{tls_connector, BoxedSocket};
use crate::engine::{EngineOptions, ServerUrl};
use crate::error::{Result, SocketIoError};

/// Open a socket to the server named by `url`.
///
/// The TCP connect and the TLS handshake are each bounded by
/// `options.timeout`.
pub async fn connect(url: &ServerUrl, options: &EngineOptions) -> Result<BoxedSocket> {
    let addr = format!("{}:{}", url.host(), url.port());
    let stream = bounded(options.timeout, &addr, TcpStream::connect(&addr)).await??;
    stream.set_nodelay(true)?;

    if !url.is_secured() {
        tracing::debug!(%addr, "tcp connected");
        return Ok(Box::new(stream));
    }

    // Bracketed IPv6 hosts are not valid DNS names.
    let host = url.host().trim_start_matches('[').trim_end_matches(']');
    let domain = ServerName::try_from(host.to_string())
        .map_err(|_| SocketIoError::Tls(format!("invalid server name {:?}", host)))?;

    let connector = tls_connector(options.tls_verify)?;
    let tls = bounded(options.timeout, &addr, connector.connect(domain, stream))
        .await?
        .map_err(|e| SocketIoError::Tls(e.to_string()))?;

    tracing::debug!(%addr, verify = options.tls_verify, "tls connected");
    Ok(Box::new(tls))
}

async fn bounded<F: std::future::Future>(limit: Duration, addr: &str, fut: F) -> Result<F::Output> {
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        SocketIoError::ServerConnectionFailure(format!("connecting to {} timed out after {:?}", addr, limit))
    })
}
