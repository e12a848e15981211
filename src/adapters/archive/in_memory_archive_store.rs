//! In-Memory Archive Store Adapter
//!
//! Keeps archived threads in memory. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::ThreadId;
use crate::domain::thread::ArchivedThread;
use crate::ports::{ArchiveError, ArchiveStore};

/// In-memory archive keyed by thread id
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchiveStore {
    records: Arc<RwLock<HashMap<ThreadId, ArchivedThread>>>,
}

impl InMemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archived threads
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ArchiveStore for InMemoryArchiveStore {
    async fn archive(
        &self,
        thread_id: &ThreadId,
        record: &ArchivedThread,
    ) -> Result<(), ArchiveError> {
        self.records
            .write()
            .await
            .insert(*thread_id, record.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &ThreadId) -> Result<Option<ArchivedThread>, ArchiveError> {
        Ok(self.records.read().await.get(thread_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(closed_at: &str) -> ArchivedThread {
        ArchivedThread {
            active: false,
            messages: vec![],
            students: vec![],
            closed_at: closed_at.to_string(),
        }
    }

    #[tokio::test]
    async fn archive_then_load() {
        let store = InMemoryArchiveStore::new();
        let id = ThreadId::parse("4821").unwrap();

        store.archive(&id, &record("2024-01-01T00:00:00Z")).await.unwrap();

        assert_eq!(
            store.load(&id).await.unwrap(),
            Some(record("2024-01-01T00:00:00Z"))
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let store = InMemoryArchiveStore::new();
        assert!(store
            .load(&ThreadId::parse("1234").unwrap())
            .await
            .unwrap()
            .is_none());
        assert!(store.is_empty().await);
    }
}
