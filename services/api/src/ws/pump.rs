//! The two forwarding loops that move frames between client and provider.
//!
//! Each loop owns one connection's read half and the other connection's write
//! half, so the loops never contend for the same half. Frames are forwarded
//! whole and in receipt order. Text is forwarded exactly as received; parsing
//! happens only for logging.

use super::{
    error::RelayError,
    frame::{Frame, TransportError, WsFrame},
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use realtime_relay_core::{Envelope, EventKind};
use std::{fmt, time::Duration};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToUpstream,
    UpstreamToClient,
}

impl Direction {
    fn peer_closed(self) -> PumpExit {
        match self {
            Direction::ClientToUpstream => PumpExit::DownstreamDisconnected,
            Direction::UpstreamToClient => PumpExit::UpstreamClosed,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToUpstream => write!(f, "client->upstream"),
            Direction::UpstreamToClient => write!(f, "upstream->client"),
        }
    }
}

/// Why the pump stopped. Only the first loop to finish is reported.
#[derive(Debug)]
pub enum PumpExit {
    /// The client closed its connection.
    DownstreamDisconnected,
    /// The provider closed its connection.
    UpstreamClosed,
    Failed(RelayError),
}

/// Runs both forwarding loops until either one finishes.
///
/// The loop that is still running is dropped as soon as the other returns, so
/// teardown never waits on a peer that has stopped talking. When `idle_timeout`
/// is set, the pump also stops once no frame has moved in either direction for
/// that long.
pub async fn run<D, DM, DE, U, UM, UE>(
    downstream: &mut D,
    upstream: &mut U,
    idle_timeout: Option<Duration>,
) -> PumpExit
where
    D: Stream<Item = Result<DM, DE>> + Sink<DM, Error = DE> + Unpin,
    U: Stream<Item = Result<UM, UE>> + Sink<UM, Error = UE> + Unpin,
    DM: WsFrame,
    UM: WsFrame,
    DE: TransportError,
    UE: TransportError,
{
    let activity = Notify::new();
    let (mut client_tx, mut client_rx) = downstream.split::<DM>();
    let (mut upstream_tx, mut upstream_rx) = upstream.split::<UM>();

    let client_to_upstream = forward(
        Direction::ClientToUpstream,
        &mut client_rx,
        &mut upstream_tx,
        &activity,
    );
    let upstream_to_client = forward(
        Direction::UpstreamToClient,
        &mut upstream_rx,
        &mut client_tx,
        &activity,
    );

    tokio::select! {
        exit = client_to_upstream => exit,
        exit = upstream_to_client => exit,
        limit = idle_watchdog(idle_timeout, &activity) => {
            PumpExit::Failed(RelayError::IdleTimeout(limit))
        }
    }
}

async fn forward<R, W, In, Out, RE, WE>(
    direction: Direction,
    rx: &mut R,
    tx: &mut W,
    activity: &Notify,
) -> PumpExit
where
    R: Stream<Item = Result<In, RE>> + Unpin,
    W: Sink<Out, Error = WE> + Unpin,
    In: WsFrame,
    Out: WsFrame,
    RE: TransportError,
    WE: TransportError,
{
    while let Some(received) = rx.next().await {
        let frame = match received {
            Ok(message) => message.into_frame(),
            Err(e) if e.is_disconnect() => {
                debug!(%direction, error = %e, "Peer dropped the connection.");
                return direction.peer_closed();
            }
            Err(e) => {
                return PumpExit::Failed(RelayError::Receive {
                    direction,
                    reason: e.to_string(),
                });
            }
        };

        let outgoing = match frame {
            Frame::Text(text) => {
                inspect(direction, &text);
                Out::from_text(text)
            }
            Frame::Binary(data) => {
                debug!(%direction, len = data.len(), "Forwarding binary frame.");
                Out::from_binary(data)
            }
            Frame::Close => {
                info!(%direction, "Peer sent close frame.");
                return direction.peer_closed();
            }
            Frame::Control => continue,
        };
        activity.notify_one();

        if let Err(e) = tx.send(outgoing).await {
            return PumpExit::Failed(RelayError::Forward {
                direction,
                reason: e.to_string(),
            });
        }
    }

    info!(%direction, "Connection stream ended.");
    direction.peer_closed()
}

/// Logs what a text frame carries. Never affects forwarding.
fn inspect(direction: Direction, text: &str) {
    let envelope = match Envelope::peek(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(%direction, error = %e, "Forwarding frame that is not valid JSON.");
            return;
        }
    };
    debug!(%direction, event_type = envelope.event_type(), "Forwarding frame.");

    if direction == Direction::UpstreamToClient {
        match envelope.kind() {
            EventKind::SessionCreated => info!("Realtime session created."),
            EventKind::Error => {
                let detail = envelope
                    .error_detail()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                error!(%detail, "Realtime API reported an error.");
            }
            EventKind::Other => {}
        }
    }
}

/// Resolves once `activity` has been quiet for `limit`. Never resolves without a limit.
async fn idle_watchdog(limit: Option<Duration>, activity: &Notify) -> Duration {
    let Some(limit) = limit else {
        return std::future::pending().await;
    };
    loop {
        let quiet = tokio::time::timeout(limit, activity.notified()).await;
        if quiet.is_err() {
            warn!(?limit, "No traffic in either direction; ending session.");
            return limit;
        }
    }
}
