//! Axum router configuration for the relay.

use axum::routing::get;
use axum::Router;
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::ws_handler;
use crate::config::ServerConfig;

use super::handlers::{get_archived_thread, health, RelayAppState};

/// Create the relay router.
///
/// # Routes
/// - `GET /ws` - WebSocket upgrade for the relay protocol
/// - `GET /health` - Liveness and live counters
/// - `GET /archive/:thread_id` - Archived record of a closed thread
pub fn relay_router(state: RelayAppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/archive/:thread_id", get(get_archived_thread))
        .layer(cors_layer(server.allowed_origins()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when none are configured, otherwise only the listed ones.
fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let Some(origins) = origins else {
        return layer.allow_origin(Any);
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}
