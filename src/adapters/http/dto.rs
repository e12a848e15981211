//! Response bodies for the relay's HTTP endpoints.

use serde::Serialize;

use crate::domain::thread::{ArchivedThread, Note};

/// Liveness report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub open_threads: usize,
    pub connected_clients: usize,
}

/// Public view of an archived thread.
///
/// The roster is reduced to display names; contact details and connection
/// ids stay in the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedThreadResponse {
    pub active: bool,
    pub messages: Vec<Note>,
    pub students: Vec<String>,
    pub closed_at: String,
}

impl From<ArchivedThread> for ArchivedThreadResponse {
    fn from(record: ArchivedThread) -> Self {
        Self {
            active: record.active,
            messages: record.messages,
            students: record.students.into_iter().map(|s| s.name).collect(),
            closed_at: record.closed_at,
        }
    }
}

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
