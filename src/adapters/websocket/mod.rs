//! WebSocket adapters for the real-time relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     ws_handler (one task per connection)             │
//! │   - Parses client frames into ClientEvent                           │
//! │   - Drains the connection's outbox to the socket                    │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ dispatches
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SessionGateway                                  │
//! │   - Checks the event against the connection's role                  │
//! │   - Mutates the ThreadRegistry                                      │
//! │   - Hands closed threads to the Archivist                           │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ broadcasts
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      RoomManager                                     │
//! │   Room: 4821           Room: 1377           Room: 6502              │
//! │   ├── conn-a           ├── conn-d           ├── conn-g              │
//! │   ├── conn-b           └── conn-e           └── conn-h              │
//! │   └── conn-c                                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`rooms`] - Room management for thread-based routing
//! - [`gateway`] - Per-connection role checks and registry operations
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod rooms;

pub use gateway::{ConnectionSession, GatewayError, RelayStats, SessionGateway};
pub use handler::ws_handler;
pub use messages::{ClientEvent, JoinRequest, NoteRequest, ServerEvent};
pub use rooms::{Outbox, RoomManager};
