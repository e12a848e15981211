//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `thread` - Thread aggregate, registry and identifier allocation
//! - `connection` - Per-connection role state machine

pub mod connection;
pub mod foundation;
pub mod thread;
