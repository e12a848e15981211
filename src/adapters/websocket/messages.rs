//! WebSocket message types for the relay protocol.
//!
//! Every frame is one JSON object `{"event": "<name>", "data": <payload>}`;
//! events without a payload omit `data`.
//! - Client → Server: create, join, send a note, close
//! - Server → Client: confirmations, notes, notices, closure, errors

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ThreadId;
use crate::domain::thread::Note;

// ============================================
// Client → Server Messages
// ============================================

/// All events a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Open a new thread and become its instructor.
    CreateThread,

    /// Join an open thread as a student.
    JoinThread(JoinRequest),

    /// Post a note to the bound thread.
    SendNote(NoteRequest),

    /// Close the bound thread. Carries the thread id as a bare string.
    CloseThread(String),
}

/// Payload of `join-thread`. Missing fields arrive as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRequest {
    pub thread_id: String,
    pub name: String,
    pub email: String,
}

/// Payload of `send-note`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteRequest {
    pub thread_id: String,
    pub name: String,
    pub text: String,
}

// ============================================
// Server → Client Messages
// ============================================

/// All events the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Creation confirmed; sent to the creator only.
    ThreadCreated(ThreadId),

    /// Join confirmed, with the log so far for backfill.
    JoinedSuccess(Vec<Note>),

    /// One newly appended note.
    ReceiveNote(Note),

    /// Roster or lifecycle notice.
    SystemMessage(String),

    /// The thread is gone; no further events follow for it.
    ThreadClosed,

    /// The previous request was rejected.
    Error(String),
}

impl ServerEvent {
    pub fn joined_notice(name: &str) -> Self {
        ServerEvent::SystemMessage(format!("> {} has jacked in.", name))
    }

    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ThreadCreated(_) => "thread-created",
            ServerEvent::JoinedSuccess(_) => "joined-success",
            ServerEvent::ReceiveNote(_) => "receive-note",
            ServerEvent::SystemMessage(_) => "system-message",
            ServerEvent::ThreadClosed => "thread-closed",
            ServerEvent::Error(_) => "error",
        }
    }
}
