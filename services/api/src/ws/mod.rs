//! WebSocket Relay
//!
//! Everything that happens on the two relay routes lives here:
//!
//! - `session`: The per-connection lifecycle, from accept to teardown.
//! - `upstream`: Connecting to and closing the realtime provider connection.
//! - `pump`: The two concurrent forwarding loops.
//! - `frame`: A common view over the downstream and upstream message types.
//! - `error`: The failures that can end a session.

pub mod error;
pub mod frame;
pub mod pump;
pub mod session;
pub mod upstream;

pub use error::RelayError;
pub use session::{RelaySession, SessionState, text_ws_handler, voice_ws_handler};
