//! Note id sequence.

use crate::domain::foundation::{NoteId, Timestamp};

/// Yields strictly increasing note ids that track wall-clock milliseconds.
///
/// Each id is `max(now_millis, previous + 1)`, so two notes appended within
/// the same millisecond still get distinct, ordered ids.
#[derive(Debug, Default)]
pub struct NoteIdSequence {
    last: u64,
}

impl NoteIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_at(&mut self, now: &Timestamp) -> NoteId {
        let millis = u64::try_from(now.as_unix_millis()).unwrap_or(0);
        let next = millis.max(self.last + 1);
        self.last = next;
        NoteId::new(next)
    }
}
