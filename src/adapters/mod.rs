//! Adapters - Implementations of port interfaces and transport surfaces.
//!
//! - `archive` - Archive store implementations (file, in-memory)
//! - `websocket` - Relay protocol over WebSocket
//! - `http` - Axum router, health and archive endpoints

pub mod archive;
pub mod http;
pub mod websocket;

pub use archive::{FileArchiveStore, InMemoryArchiveStore};
