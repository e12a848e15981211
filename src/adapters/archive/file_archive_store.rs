//! File-based Archive Store Adapter
//!
//! Keeps every archived thread in a single JSON object keyed by thread id.
//! Entries already in the file are carried over untouched, including ones
//! this process did not write.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::ThreadId;
use crate::domain::thread::ArchivedThread;
use crate::ports::{ArchiveError, ArchiveStore};

/// File-backed archive store
#[derive(Debug)]
pub struct FileArchiveStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileArchiveStore {
    /// Create a store backed by the file at `path`
    ///
    /// The file does not need to exist yet.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileArchiveStore::new("./data/database.json");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the new contents are written to before the rename
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the whole store; a missing file is an empty store
    async fn read_entries(&self) -> Result<Map<String, Value>, ArchiveError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(ArchiveError::Io(e.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&raw).map_err(|e| ArchiveError::Deserialization(e.to_string()))
    }

    /// Same as `read_entries`, but an unreadable store is replaced by an
    /// empty one so new closures can still be recorded
    async fn read_entries_or_reset(&self) -> Map<String, Value> {
        match self.read_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Archive store unreadable, starting from an empty store"
                );
                Map::new()
            }
        }
    }

    async fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), ArchiveError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ArchiveError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| ArchiveError::Serialization(e.to_string()))?;

        let temp = self.temp_path();
        fs::write(&temp, json)
            .await
            .map_err(|e| ArchiveError::Io(e.to_string()))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| ArchiveError::Io(e.to_string()))
    }
}

#[async_trait]
impl ArchiveStore for FileArchiveStore {
    async fn archive(
        &self,
        thread_id: &ThreadId,
        record: &ArchivedThread,
    ) -> Result<(), ArchiveError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_entries_or_reset().await;
        let value =
            serde_json::to_value(record).map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        entries.insert(thread_id.to_string(), value);

        self.write_entries(&entries).await?;

        tracing::debug!(
            thread_id = %thread_id,
            path = %self.path.display(),
            records = entries.len(),
            "Thread archived to file"
        );
        Ok(())
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<ArchivedThread>, ArchiveError> {
        let mut entries = self.read_entries().await?;
        entries
            .remove(thread_id.as_str())
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ArchiveError::Deserialization(e.to_string()))
    }
}
