//! Ports - interfaces the domain and application layers depend on.
//!
//! Adapters implement these traits; the relay only ever sees the trait.

mod archive_store;

pub use archive_store::{ArchiveError, ArchiveStore};
