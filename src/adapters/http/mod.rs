//! HTTP adapters - the relay's HTTP surface.
//!
//! - `GET /ws` - WebSocket upgrade, see [`crate::adapters::websocket`]
//! - `GET /health` - Liveness with open thread and connection counts
//! - `GET /archive/:thread_id` - Archived record lookup

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ArchiveApiError, RelayAppState};
pub use routes::relay_router;
