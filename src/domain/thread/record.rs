//! Archived thread record - the persisted shape of a closed thread.

use serde::{Deserialize, Serialize};

use super::{Note, Participant, Thread};

/// Final state of a thread as written to the archive store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedThread {
    pub active: bool,
    pub messages: Vec<Note>,
    pub students: Vec<Participant>,
    /// RFC 3339 closure time.
    pub closed_at: String,
}

impl ArchivedThread {
    /// Builds the record from a closed snapshot.
    ///
    /// A snapshot without a closure time (never expected from the registry)
    /// is recorded as closed at its opening time.
    pub fn from_snapshot(thread: &Thread) -> Self {
        let closed_at = thread.closed_at().unwrap_or_else(|| thread.opened_at());
        Self {
            active: false,
            messages: thread.notes().to_vec(),
            students: thread.participants().to_vec(),
            closed_at: closed_at.to_rfc3339(),
        }
    }
}
