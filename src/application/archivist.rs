//! Archivist - Background service that records closed threads.
//!
//! Closing a thread hands its final snapshot to the archivist and returns
//! immediately; the write happens on a dedicated task. Jobs are processed
//! one at a time in submission order, so two closures never race on the
//! store.
//!
//! ## Failure Handling
//!
//! Storage failures are logged and swallowed. They never reach clients and
//! never delay the closure broadcast.
//!
//! ## Shutdown
//!
//! `flush()` waits until every snapshot submitted before the call has been
//! processed. The worker stops once every `Archivist` handle is dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::domain::thread::{ArchivedThread, Thread};
use crate::ports::ArchiveStore;

enum ArchiveJob {
    Snapshot(Thread),
    Flush(oneshot::Sender<()>),
}

/// Handle for submitting closed threads to the archive worker.
#[derive(Clone)]
pub struct Archivist {
    jobs: mpsc::UnboundedSender<ArchiveJob>,
}

impl Archivist {
    /// Spawn the worker on the current runtime.
    ///
    /// Returns the submission handle and the worker's join handle.
    pub fn spawn(store: Arc<dyn ArchiveStore>) -> (Self, JoinHandle<()>) {
        let (jobs, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(store, rx));
        (Self { jobs }, worker)
    }

    /// Queue a closed thread for archival without waiting for the write.
    pub fn submit(&self, snapshot: Thread) {
        let thread_id = snapshot.id();
        if self.jobs.send(ArchiveJob::Snapshot(snapshot)).is_err() {
            tracing::error!(thread_id = %thread_id, "Archive worker stopped, snapshot dropped");
        }
    }

    /// Wait until every snapshot submitted so far has been processed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.jobs.send(ArchiveJob::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }
}

async fn run(store: Arc<dyn ArchiveStore>, mut jobs: mpsc::UnboundedReceiver<ArchiveJob>) {
    while let Some(job) = jobs.recv().await {
        match job {
            ArchiveJob::Snapshot(thread) => {
                let thread_id = thread.id();
                let record = ArchivedThread::from_snapshot(&thread);
                match store.archive(&thread_id, &record).await {
                    Ok(()) => tracing::info!(
                        thread_id = %thread_id,
                        messages = record.messages.len(),
                        students = record.students.len(),
                        "Thread archived"
                    ),
                    Err(e) => tracing::error!(
                        thread_id = %thread_id,
                        error = %e,
                        code = %e.code(),
                        "Failed to archive thread"
                    ),
                }
            }
            ArchiveJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Archive worker stopped");
}
