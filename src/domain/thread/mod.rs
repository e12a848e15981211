//! Thread module - live discussion threads and their registry.
//!
//! # Components
//!
//! - `Thread` - one code-addressed session with an append-only note log
//! - `ThreadRegistry` - the process-wide table of open threads
//! - `ThreadIdAllocator` - bounded random draw plus scan for fresh codes
//! - `NoteIdSequence` - strictly increasing note ids
//! - `ArchivedThread` - persisted shape of a closed thread

mod aggregate;
mod allocator;
mod errors;
mod record;
mod registry;
mod sequence;

pub use aggregate::{Note, Participant, Thread};
pub use allocator::{
    CandidateSource, RandomCandidates, ThreadIdAllocator, MAX_THREAD_CODE, MIN_THREAD_CODE,
    THREAD_CODE_SPACE,
};
pub use errors::ThreadError;
pub use record::ArchivedThread;
pub use registry::ThreadRegistry;
pub use sequence::NoteIdSequence;
