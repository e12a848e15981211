//! Archive Adapters
//!
//! Implementations of the ArchiveStore port.
//!
//! ## Available Adapters
//!
//! - **FileArchiveStore** - One JSON object on disk keyed by thread id
//! - **InMemoryArchiveStore** - Keeps records in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::archive::{FileArchiveStore, InMemoryArchiveStore};
//!
//! // Production: file-based store
//! let store = FileArchiveStore::new("database.json");
//!
//! // Testing: in-memory store
//! let store = InMemoryArchiveStore::new();
//! ```

mod file_archive_store;
mod in_memory_archive_store;

pub use file_archive_store::FileArchiveStore;
pub use in_memory_archive_store::InMemoryArchiveStore;
