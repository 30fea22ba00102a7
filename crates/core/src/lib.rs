//! Pure data shared by the relay service: relay modes, the `session.update`
//! negotiation message, and envelope introspection.

pub mod envelope;
pub mod mode;
pub mod session_config;

pub use envelope::{Envelope, EnvelopeError, EventKind, RelayEvent};
pub use mode::RelayMode;
pub use session_config::{ClientEvent, SessionConfig, session_update};
