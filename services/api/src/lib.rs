//! Realtime Relay Library Crate
//!
//! This library contains all the logic for the relay web service: configuration,
//! application state, HTTP handlers, routing, and the WebSocket relay itself.
//! The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod ws;
