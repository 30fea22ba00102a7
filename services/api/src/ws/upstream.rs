//! Opens and closes the WebSocket connection to the realtime provider.

use super::error::RelayError;
use crate::config::Config;
use futures_util::{Sink, SinkExt};
use secrecy::ExposeSecret;
use std::{fmt, time::Duration};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};
use tracing::{debug, info, warn};

/// Opt-in header required by the realtime beta API.
pub const BETA_HEADER: &str = "OpenAI-Beta";
pub const BETA_HEADER_VALUE: &str = "realtime=v1";

pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to `config.realtime_url`, bounded by `config.connect_timeout`.
///
/// A non-success upgrade response becomes [`RelayError::UpstreamHandshake`];
/// everything else that goes wrong becomes [`RelayError::UpstreamConnect`].
/// No retries happen here.
pub async fn connect(config: &Config) -> Result<UpstreamSocket, RelayError> {
    let mut request = config
        .realtime_url
        .as_str()
        .into_client_request()
        .map_err(|e| RelayError::UpstreamConnect(e.to_string()))?;

    let token = format!("Bearer {}", config.openai_api_key.expose_secret());
    let mut bearer = HeaderValue::from_str(&token)
        .map_err(|e| RelayError::UpstreamConnect(format!("invalid API key header: {}", e)))?;
    bearer.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, bearer);
    request
        .headers_mut()
        .insert(BETA_HEADER, HeaderValue::from_static(BETA_HEADER_VALUE));

    let attempt = tokio::time::timeout(config.connect_timeout, connect_async(request))
        .await
        .map_err(|_| RelayError::UpstreamTimeout(config.connect_timeout))?;

    match attempt {
        Ok((socket, response)) => {
            info!(status = %response.status(), "Connected to realtime API.");
            Ok(socket)
        }
        Err(tungstenite::Error::Http(response)) => Err(RelayError::UpstreamHandshake {
            status: response.status().as_u16(),
        }),
        Err(e) => Err(RelayError::UpstreamConnect(e.to_string())),
    }
}

/// Starts or completes the close handshake on `socket`.
///
/// Safe to call on a socket that is already closed: the error a closed socket
/// returns is logged and dropped. Gives up after `timeout`.
pub async fn close<S, M>(socket: &mut S, timeout: Duration)
where
    S: Sink<M> + Unpin,
    S::Error: fmt::Display,
{
    match tokio::time::timeout(timeout, SinkExt::<M>::close(socket)).await {
        Ok(Ok(())) => debug!("Connection closed."),
        Ok(Err(e)) => debug!(error = %e, "Connection already closed."),
        Err(_) => warn!(?timeout, "Timed out closing connection."),
    }
}
