//! Archive Store Port - Interface for recording closed threads.
//!
//! One record per thread id, merged into a shared keyed store. Archiving
//! one thread never erases another thread's record.

use async_trait::async_trait;

use crate::domain::foundation::{ErrorCode, ThreadId};
use crate::domain::thread::ArchivedThread;

/// Errors that can occur during archive operations
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to serialize archive: {0}")]
    Serialization(String),

    #[error("Failed to deserialize archive: {0}")]
    Deserialization(String),
}

impl ArchiveError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::StorageError
    }
}

/// Port for recording and reading archived threads
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Merge a closed thread's record into the store under its id
    ///
    /// # Errors
    /// Returns `ArchiveError` if the store cannot be written
    async fn archive(
        &self,
        thread_id: &ThreadId,
        record: &ArchivedThread,
    ) -> Result<(), ArchiveError>;

    /// Load the record archived under `thread_id`, if any
    ///
    /// The most recent closure wins when a code was reused.
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<ArchivedThread>, ArchiveError>;
}
