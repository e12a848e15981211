//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the relay domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{require_non_blank, ErrorCode, ValidationError};
pub use ids::{ConnectionId, NoteId, ThreadId, THREAD_ID_WIDTH};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
