//! Thread registry - the table of every open thread.
//!
//! The registry is the single source of truth for "is this thread open and
//! who is in it". It performs no locking of its own: the owner (the session
//! gateway) holds it behind one mutex, so each operation runs to completion
//! without interleaving.

use std::collections::HashMap;

use crate::domain::foundation::{ThreadId, Timestamp};

use super::{Note, NoteIdSequence, Participant, Thread, ThreadError, ThreadIdAllocator};

/// Process-wide table of open threads.
pub struct ThreadRegistry {
    threads: HashMap<ThreadId, Thread>,
    allocator: ThreadIdAllocator,
    note_ids: NoteIdSequence,
}

impl ThreadRegistry {
    pub fn new(allocator: ThreadIdAllocator) -> Self {
        Self {
            threads: HashMap::new(),
            allocator,
            note_ids: NoteIdSequence::new(),
        }
    }

    /// Opens a new empty thread under a code no open thread holds.
    pub fn create_thread(&mut self) -> Result<ThreadId, ThreadError> {
        let threads = &self.threads;
        let id = self.allocator.allocate(|candidate| threads.contains_key(candidate))?;
        self.threads.insert(id, Thread::open(id));
        Ok(id)
    }

    /// Admits a participant and returns the current log for backfill.
    ///
    /// Unknown and closed threads both fail with `NotFound`; nothing is
    /// mutated on failure.
    pub fn join_thread(
        &mut self,
        id: &ThreadId,
        participant: Participant,
    ) -> Result<Vec<Note>, ThreadError> {
        let thread = self
            .threads
            .get_mut(id)
            .filter(|t| t.is_active())
            .ok_or(ThreadError::NotFound(*id))?;
        thread.admit(participant)?;
        Ok(thread.notes().to_vec())
    }

    /// Stamps and appends a note, returning the stored copy for broadcast.
    pub fn append_note(
        &mut self,
        id: &ThreadId,
        author: &str,
        text: &str,
    ) -> Result<Note, ThreadError> {
        let thread = self.threads.get_mut(id).ok_or(ThreadError::NotFound(*id))?;
        if !thread.is_active() {
            return Err(ThreadError::Inactive(*id));
        }

        let received = Timestamp::now();
        let note = Note {
            id: self.note_ids.next_at(&received),
            name: author.to_string(),
            text: text.to_string(),
            timestamp: received.to_clock_string(),
        };
        thread.append(note).cloned()
    }

    /// Closes a thread, removes it from the table and returns the final
    /// snapshot. The code becomes free for reallocation.
    pub fn close_thread(&mut self, id: &ThreadId) -> Result<Thread, ThreadError> {
        let mut thread = self.threads.remove(id).ok_or(ThreadError::NotFound(*id))?;
        thread.close(Timestamp::now())?;
        Ok(thread)
    }

    /// Looks up an open thread.
    pub fn get(&self, id: &ThreadId) -> Option<&Thread> {
        self.threads.get(id)
    }

    pub fn is_open(&self, id: &ThreadId) -> bool {
        self.threads.get(id).is_some_and(Thread::is_active)
    }

    /// Number of open threads.
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}
