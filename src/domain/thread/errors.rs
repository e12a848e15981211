//! Thread registry error types.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ThreadId};

/// Failures returned by the thread registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    /// No open thread carries this code.
    #[error("Thread not found: {0}")]
    NotFound(ThreadId),

    /// The thread exists but no longer accepts changes.
    #[error("Thread is closed: {0}")]
    Inactive(ThreadId),

    /// Every code in the identifier space belongs to an open thread.
    #[error("All {0} thread codes are in use")]
    IdSpaceExhausted(usize),
}

impl ThreadError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ThreadError::NotFound(_) => ErrorCode::ThreadNotFound,
            ThreadError::Inactive(_) => ErrorCode::ThreadInactive,
            ThreadError::IdSpaceExhausted(_) => ErrorCode::IdSpaceExhausted,
        }
    }
}
