use std::fmt;

/// Selects which fixed session configuration a relay sends upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayMode {
    /// Audio in, audio and text out.
    Voice,
    /// Text only.
    Text,
}

impl RelayMode {
    /// The downstream WebSocket route serving this mode.
    pub fn path(self) -> &'static str {
        match self {
            RelayMode::Voice => "/realtime-voice",
            RelayMode::Text => "/text-chat",
        }
    }
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayMode::Voice => write!(f, "voice"),
            RelayMode::Text => write!(f, "text"),
        }
    }
}
