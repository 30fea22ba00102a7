//! Introspection of relayed JSON envelopes and the one envelope the relay writes
//! to clients itself.
//!
//! Relayed frames are never re-serialized. [`Envelope::peek`] exists only so the
//! relay can log what passes through it.

use serde::Serialize;
use serde_json::Value;

/// Reported when a relayed frame is not valid JSON.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Event types the relay recognizes for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SessionCreated,
    Error,
    Other,
}

/// A parsed view of one relayed JSON message.
#[derive(Debug, Clone)]
pub struct Envelope {
    value: Value,
}

impl Envelope {
    /// Parses `text` as JSON. Any JSON value is accepted; a missing `type` is not an error.
    pub fn peek(text: &str) -> Result<Self, EnvelopeError> {
        let value = serde_json::from_str(text)?;
        Ok(Self { value })
    }

    /// The `type` tag, or `"unknown"` when absent or not a string.
    pub fn event_type(&self) -> &str {
        self.value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }

    pub fn kind(&self) -> EventKind {
        match self.event_type() {
            "session.created" => EventKind::SessionCreated,
            "error" => EventKind::Error,
            _ => EventKind::Other,
        }
    }

    /// The provider's `error` payload, if this envelope carries one.
    pub fn error_detail(&self) -> Option<&Value> {
        self.value.get("error")
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
}

/// Events originated by the relay and sent to the downstream client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A terminal failure; the connection closes after it.
    Error { error: ErrorBody },
}

impl RelayEvent {
    pub fn error(message: impl Into<String>) -> Self {
        RelayEvent::Error {
            error: ErrorBody {
                message: message.into(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
