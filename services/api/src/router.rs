//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the relay: the two
//! WebSocket relay routes, the health check, and the static client page.

use crate::{
    handlers,
    state::AppState,
    ws::{text_ws_handler, voice_ws_handler},
};

use axum::{Router, routing::get};
use realtime_relay_core::RelayMode;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();

    // Group all routes that require AppState into their own router.
    let relay_router = Router::new()
        .route(RelayMode::Voice.path(), get(voice_ws_handler))
        .route(RelayMode::Text.path(), get(text_ws_handler))
        .route("/health", get(handlers::health))
        .with_state(app_state);

    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .merge(relay_router)
}
