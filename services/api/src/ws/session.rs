//! Manages the lifecycle of one relay session, from the accepted client socket
//! to the point where both connections are closed.

use super::{
    error::RelayError,
    frame::{TransportError, WsFrame},
    pump::{self, PumpExit},
    upstream,
};
use crate::{config::Config, state::AppState};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream};
use realtime_relay_core::{RelayEvent, RelayMode, session_update};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler for the voice relay route.
pub async fn voice_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, RelayMode::Voice, state))
}

/// Axum handler for the text relay route.
pub async fn text_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, RelayMode::Text, state))
}

#[instrument(name = "relay_session", skip_all, fields(session_id = %Uuid::new_v4(), mode = %mode))]
async fn handle_socket(socket: WebSocket, mode: RelayMode, state: Arc<AppState>) {
    info!("Client connected.");
    let session = RelaySession::new(mode).run(socket, &state.config).await;
    match session.error() {
        Some(e) => info!(error = %e, "Relay session closed after failure."),
        None => info!("Relay session closed."),
    }
}

/// Lifecycle states of a [`RelaySession`].
///
/// `Accepted -> Connecting -> Configuring -> Pumping -> Closing -> Closed`, with
/// any failure detouring through `ErrorReporting` before `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Accepted,
    Connecting,
    Configuring,
    Pumping,
    ErrorReporting,
    Closing,
    Closed,
}

/// One accepted client connection and the upstream connection it pairs with.
#[derive(Debug)]
pub struct RelaySession {
    mode: RelayMode,
    state: SessionState,
    error: Option<RelayError>,
}

impl RelaySession {
    pub fn new(mode: RelayMode) -> Self {
        Self {
            mode,
            state: SessionState::Accepted,
            error: None,
        }
    }

    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn error(&self) -> Option<&RelayError> {
        self.error.as_ref()
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session state transition.");
        self.state = next;
    }

    /// Drives the session to completion and returns it in the `Closed` state.
    ///
    /// Never fails: every error is reported to the client when it is still
    /// there, recorded on the session, and followed by teardown. Dropping the
    /// returned future drops both sockets, which releases the connections.
    pub async fn run<D, E>(self, downstream: D, config: &Config) -> Self
    where
        D: Stream<Item = Result<Message, E>> + Sink<Message, Error = E> + Unpin,
        E: TransportError,
    {
        let connect = upstream::connect(config);
        self.run_with(downstream, connect, config).await
    }

    /// Runs the session over whatever provider connection `connect` yields.
    async fn run_with<D, E, U, UM, UE>(
        mut self,
        mut downstream: D,
        connect: impl Future<Output = Result<U, RelayError>>,
        config: &Config,
    ) -> Self
    where
        D: Stream<Item = Result<Message, E>> + Sink<Message, Error = E> + Unpin,
        E: TransportError,
        U: Stream<Item = Result<UM, UE>> + Sink<UM, Error = UE> + Unpin,
        UM: WsFrame,
        UE: TransportError,
    {
        let mut provider: Option<U> = None;

        let relayed = self.relay(&mut downstream, &mut provider, connect, config);
        if let Err(e) = relayed.await {
            self.transition(SessionState::ErrorReporting);
            if e.is_downstream_gone() {
                warn!(error = %e, "Client connection failed; nothing to report.");
            } else {
                error!(error = %e, "Relay session failed.");
                report_error(&mut downstream, &e).await;
            }
            self.error = Some(e);
        }

        self.transition(SessionState::Closing);
        if let Some(socket) = provider.as_mut() {
            upstream::close::<_, UM>(socket, config.close_timeout).await;
        }
        upstream::close::<_, Message>(&mut downstream, config.close_timeout).await;
        self.transition(SessionState::Closed);
        self
    }

    async fn relay<D, E, U, UM, UE>(
        &mut self,
        downstream: &mut D,
        provider: &mut Option<U>,
        connect: impl Future<Output = Result<U, RelayError>>,
        config: &Config,
    ) -> Result<(), RelayError>
    where
        D: Stream<Item = Result<Message, E>> + Sink<Message, Error = E> + Unpin,
        E: TransportError,
        U: Stream<Item = Result<UM, UE>> + Sink<UM, Error = UE> + Unpin,
        UM: WsFrame,
        UE: TransportError,
    {
        self.transition(SessionState::Connecting);
        let socket = provider.insert(connect.await?);

        self.transition(SessionState::Configuring);
        let negotiation = session_update(self.mode)
            .to_json()
            .map_err(|e| RelayError::Configure(e.to_string()))?;
        socket
            .send(UM::from_text(negotiation))
            .await
            .map_err(|e| RelayError::Configure(e.to_string()))?;
        info!(mode = %self.mode, "Sent session configuration.");

        self.transition(SessionState::Pumping);
        match pump::run(downstream, socket, config.idle_timeout).await {
            PumpExit::DownstreamDisconnected => {
                info!("Client disconnected.");
                Ok(())
            }
            PumpExit::UpstreamClosed => {
                info!("Realtime API closed the connection.");
                Ok(())
            }
            PumpExit::Failed(e) => Err(e),
        }
    }
}

/// Sends one error envelope to the client, ignoring any failure to do so.
async fn report_error<D, E>(downstream: &mut D, err: &RelayError)
where
    D: Sink<Message, Error = E> + Unpin,
    E: TransportError,
{
    let payload = match RelayEvent::error(err.to_string()).to_json() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Could not encode error envelope.");
            return;
        }
    };
    if let Err(e) = downstream.send(Message::from_text(payload)).await {
        debug!(error = %e, "Client gone before the error could be reported.");
    }
}
