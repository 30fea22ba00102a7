//! A common view over the two WebSocket message types the relay bridges.
//!
//! The downstream leg speaks axum's message type and the upstream leg speaks
//! tungstenite's. Both map onto [`Frame`], which lets a single forwarding loop
//! serve both directions.

use axum::extract::ws::Message as AxumMessage;
use bytes::Bytes;
use std::io;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage, error::ProtocolError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
    /// The peer started the close handshake.
    Close,
    /// Ping and pong, answered by the transport itself.
    Control,
}

pub trait WsFrame: Sized {
    fn into_frame(self) -> Frame;
    fn from_text(text: String) -> Self;
    fn from_binary(data: Bytes) -> Self;
}

impl WsFrame for AxumMessage {
    fn into_frame(self) -> Frame {
        match self {
            AxumMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
            AxumMessage::Binary(data) => Frame::Binary(data),
            AxumMessage::Close(_) => Frame::Close,
            AxumMessage::Ping(_) | AxumMessage::Pong(_) => Frame::Control,
        }
    }

    fn from_text(text: String) -> Self {
        AxumMessage::Text(text.into())
    }

    fn from_binary(data: Bytes) -> Self {
        AxumMessage::Binary(data)
    }
}

impl WsFrame for WsMessage {
    fn into_frame(self) -> Frame {
        match self {
            WsMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
            WsMessage::Binary(data) => Frame::Binary(data),
            WsMessage::Close(_) => Frame::Close,
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => Frame::Control,
        }
    }

    fn from_text(text: String) -> Self {
        WsMessage::Text(text.into())
    }

    fn from_binary(data: Bytes) -> Self {
        WsMessage::Binary(data)
    }
}

/// Errors raised by either WebSocket leg.
pub trait TransportError: std::fmt::Display {
    /// True when the error only means the peer went away.
    fn is_disconnect(&self) -> bool;
}

impl TransportError for tungstenite::Error {
    fn is_disconnect(&self) -> bool {
        match self {
            tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
            tungstenite::Error::Io(e) => is_reset(e),
            _ => false,
        }
    }
}

// axum wraps the transport error, so look through the source chain for it.
impl TransportError for axum::Error {
    fn is_disconnect(&self) -> bool {
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            if let Some(e) = err.downcast_ref::<tungstenite::Error>() {
                return e.is_disconnect();
            }
            if let Some(e) = err.downcast_ref::<io::Error>() {
                return is_reset(e);
            }
            source = err.source();
        }
        false
    }
}

fn is_reset(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_survives_both_message_types() {
        let raw = r#"{"type":"response.create"}"#.to_string();

        let upstream = WsMessage::from_text(raw.clone());
        let Frame::Text(text) = upstream.into_frame() else {
            panic!("expected a text frame");
        };
        let downstream = AxumMessage::from_text(text);
        assert_eq!(downstream.into_frame(), Frame::Text(raw));
    }

    #[test]
    fn test_binary_and_control_frames() {
        let data = Bytes::from_static(&[0, 1, 2, 3]);
        assert_eq!(
            WsMessage::from_binary(data.clone()).into_frame(),
            Frame::Binary(data.clone())
        );
        assert_eq!(
            AxumMessage::from_binary(data.clone()).into_frame(),
            Frame::Binary(data)
        );
        assert_eq!(WsMessage::Ping(Bytes::new()).into_frame(), Frame::Control);
        assert_eq!(AxumMessage::Close(None).into_frame(), Frame::Close);
        assert_eq!(WsMessage::Close(None).into_frame(), Frame::Close);
    }

    #[test]
    fn test_tungstenite_disconnect_classification() {
        assert!(tungstenite::Error::ConnectionClosed.is_disconnect());
        assert!(tungstenite::Error::AlreadyClosed.is_disconnect());
        assert!(
            tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)
                .is_disconnect()
        );
        assert!(
            tungstenite::Error::Io(io::Error::from(io::ErrorKind::ConnectionReset)).is_disconnect()
        );
        assert!(!tungstenite::Error::Io(io::Error::other("disk on fire")).is_disconnect());
        assert!(!tungstenite::Error::Protocol(ProtocolError::HandshakeIncomplete).is_disconnect());
    }

    #[test]
    fn test_axum_disconnect_classification() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(axum::Error::new(tungstenite::Error::Io(reset)).is_disconnect());
        assert!(axum::Error::new(io::Error::from(io::ErrorKind::UnexpectedEof)).is_disconnect());
        assert!(axum::Error::new(tungstenite::Error::ConnectionClosed).is_disconnect());

        assert!(!axum::Error::new(io::Error::other("disk on fire")).is_disconnect());
        let protocol = tungstenite::Error::Protocol(ProtocolError::HandshakeIncomplete);
        assert!(!axum::Error::new(protocol).is_disconnect());
    }
}
