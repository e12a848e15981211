//! Thread aggregate and its parts.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConnectionId, NoteId, ThreadId, Timestamp};

use super::ThreadError;

/// One message in a thread's log.
///
/// Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub name: String,
    pub text: String,
    /// Server receipt time as a local clock string.
    pub timestamp: String,
}

/// A self-declared identity that joined a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub email: String,
    #[serde(rename = "socketId")]
    pub connection_id: ConnectionId,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            connection_id,
        }
    }
}

/// One discussion session addressed by a short code.
///
/// Holds an append-only note log and a historical roster. Once closed the
/// thread rejects every mutation.
#[derive(Debug, Clone)]
pub struct Thread {
    id: ThreadId,
    active: bool,
    notes: Vec<Note>,
    participants: Vec<Participant>,
    opened_at: Timestamp,
    closed_at: Option<Timestamp>,
}

impl Thread {
    /// Opens an empty, active thread.
    pub fn open(id: ThreadId) -> Self {
        Self {
            id,
            active: true,
            notes: Vec::new(),
            participants: Vec::new(),
            opened_at: Timestamp::now(),
            closed_at: None,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Notes in append order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Everyone who ever joined, in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    pub fn closed_at(&self) -> Option<Timestamp> {
        self.closed_at
    }

    /// Registers a participant. A connection appears in the roster once.
    pub(crate) fn admit(&mut self, participant: Participant) -> Result<(), ThreadError> {
        self.ensure_active()?;
        let known = self
            .participants
            .iter()
            .any(|p| p.connection_id == participant.connection_id);
        if !known {
            self.participants.push(participant);
        }
        Ok(())
    }

    pub(crate) fn append(&mut self, note: Note) -> Result<&Note, ThreadError> {
        self.ensure_active()?;
        self.notes.push(note);
        Ok(&self.notes[self.notes.len() - 1])
    }

    pub(crate) fn close(&mut self, at: Timestamp) -> Result<(), ThreadError> {
        self.ensure_active()?;
        self.active = false;
        self.closed_at = Some(at);
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), ThreadError> {
        if self.active {
            Ok(())
        } else {
            Err(ThreadError::Inactive(self.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> Thread {
        Thread::open(ThreadId::parse("4821").unwrap())
    }

    fn note(id: u64, text: &str) -> Note {
        Note {
            id: NoteId::new(id),
            name: "Ann".to_string(),
            text: text.to_string(),
            timestamp: "9:00:00 AM".to_string(),
        }
    }

    #[test]
    fn open_thread_is_active_and_empty() {
        let t = thread();
        assert!(t.is_active());
        assert!(t.notes().is_empty());
        assert!(t.participants().is_empty());
        assert!(t.closed_at().is_none());
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut t = thread();
        t.append(note(1, "first")).unwrap();
        t.append(note(2, "second")).unwrap();

        let texts: Vec<_> = t.notes().iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn admit_ignores_repeat_connection() {
        let mut t = thread();
        let conn = ConnectionId::new();
        t.admit(Participant::new("Ann", "a@x.com", conn)).unwrap();
        t.admit(Participant::new("Ann again", "a@x.com", conn)).unwrap();
        t.admit(Participant::new("Ann", "a@x.com", ConnectionId::new()))
            .unwrap();

        assert_eq!(t.participants().len(), 2);
        assert_eq!(t.participants()[0].name, "Ann");
    }

    #[test]
    fn closed_thread_rejects_mutation() {
        let mut t = thread();
        let id = t.id();
        t.close(Timestamp::now()).unwrap();

        assert!(!t.is_active());
        assert!(t.closed_at().is_some());
        assert_eq!(
            t.append(note(1, "late")).unwrap_err(),
            ThreadError::Inactive(id)
        );
        assert!(t
            .admit(Participant::new("Bob", "b@x.com", ConnectionId::new()))
            .is_err());
        assert!(t.close(Timestamp::now()).is_err());
        assert!(t.notes().is_empty());
    }

    #[test]
    fn participant_serializes_socket_id() {
        let p = Participant::new("Ann", "a@x.com", ConnectionId::new());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["socketId"], p.connection_id.to_string());
    }

    #[test]
    fn note_serializes_wire_shape() {
        let json = serde_json::to_value(note(42, "hello")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 42,
                "name": "Ann",
                "text": "hello",
                "timestamp": "9:00:00 AM"
            })
        );
    }
}
