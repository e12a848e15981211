//! Session gateway - the per-connection protocol handler.
//!
//! Every inbound event is checked against the connection's role, turned
//! into registry operations, and fanned out to the thread's room. The
//! registry and the rooms sit behind one mutex: an operation and its
//! broadcasts complete before the next operation starts, so every member
//! of a thread sees the same event order.
//!
//! # Roles
//!
//! ```text
//! UNBOUND ──create-thread──▶ INSTRUCTOR ──close-thread──▶ TERMINATED
//!    │                                                        ▲
//!    └──join-thread──▶ STUDENT ──────thread-closed────────────┘
//! ```
//!
//! A dropped connection leaves its room but stays on the thread's roster,
//! and an instructor disconnect does not close the thread.

use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::Archivist;
use crate::domain::connection::ConnectionState;
use crate::domain::foundation::{
    require_non_blank, ConnectionId, ErrorCode, StateMachine, ThreadId, ValidationError,
};
use crate::domain::thread::{Participant, ThreadError, ThreadRegistry};

use super::messages::{ClientEvent, JoinRequest, NoteRequest, ServerEvent};
use super::rooms::{Outbox, RoomManager};

/// Rejections reported back to the requesting connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Carries the code as the client sent it; it may not be a valid code.
    #[error("Thread not found or closed.")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Cannot {action} while {state}")]
    InvalidState {
        state: ConnectionState,
        action: &'static str,
    },

    #[error("{0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GatewayError::Validation(e) => e.code(),
            GatewayError::NotFound(_) => ErrorCode::ThreadNotFound,
            GatewayError::Forbidden(_) => ErrorCode::Forbidden,
            GatewayError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            GatewayError::Unavailable(_) => ErrorCode::IdSpaceExhausted,
        }
    }
}

impl From<ThreadError> for GatewayError {
    fn from(err: ThreadError) -> Self {
        match err {
            ThreadError::NotFound(id) | ThreadError::Inactive(id) => {
                GatewayError::NotFound(id.to_string())
            }
            ThreadError::IdSpaceExhausted(_) => GatewayError::Unavailable(err.to_string()),
        }
    }
}

/// Transient state of one transport connection.
///
/// Owned by the connection's task; the gateway only reads and updates it
/// while handling that connection's events.
#[derive(Debug)]
pub struct ConnectionSession {
    id: ConnectionId,
    state: ConnectionState,
    thread: Option<ThreadId>,
    display_name: Option<String>,
    outbox: Outbox,
}

impl ConnectionSession {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            id: ConnectionId::new(),
            state: ConnectionState::Unbound,
            thread: None,
            display_name: None,
            outbox,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Thread this connection is bound to, if any.
    pub fn thread(&self) -> Option<ThreadId> {
        self.thread
    }

    /// Track lifecycle events delivered to this connection.
    pub fn observe(&mut self, event: &ServerEvent) {
        if matches!(event, ServerEvent::ThreadClosed) && self.state.is_bound() {
            self.state = ConnectionState::Terminated;
        }
    }

    fn send(&self, event: ServerEvent) {
        // A closed outbox means the socket task is already gone.
        let _ = self.outbox.send(event);
    }

    fn transition(
        &mut self,
        target: ConnectionState,
        action: &'static str,
    ) -> Result<(), GatewayError> {
        self.state = self
            .state
            .transition_to(target)
            .map_err(|_| GatewayError::InvalidState {
                state: self.state,
                action,
            })?;
        Ok(())
    }

    fn require(
        &self,
        expected: ConnectionState,
        action: &'static str,
    ) -> Result<(), GatewayError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GatewayError::InvalidState {
                state: self.state,
                action,
            })
        }
    }
}

/// Counters for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub open_threads: usize,
    pub connected_clients: usize,
}

struct Relay {
    registry: ThreadRegistry,
    rooms: RoomManager,
}

/// Process-wide protocol handler shared by every connection.
pub struct SessionGateway {
    relay: Mutex<Relay>,
    archivist: Archivist,
    instructor_name: String,
}

impl SessionGateway {
    pub fn new(
        registry: ThreadRegistry,
        archivist: Archivist,
        instructor_name: impl Into<String>,
    ) -> Self {
        Self {
            relay: Mutex::new(Relay {
                registry,
                rooms: RoomManager::new(),
            }),
            archivist,
            instructor_name: instructor_name.into(),
        }
    }

    /// Handle one event, reporting any rejection to the sender as an
    /// `error` event.
    pub async fn dispatch(&self, session: &mut ConnectionSession, event: ClientEvent) {
        if let Err(err) = self.handle(session, event).await {
            tracing::info!(
                connection_id = %session.id,
                state = %session.state,
                code = %err.code(),
                error = %err,
                "Request rejected"
            );
            session.send(ServerEvent::Error(err.to_string()));
        }
    }

    /// Handle one event from `session`.
    ///
    /// # Errors
    ///
    /// Returns the rejection that should be reported to the sender. Nothing
    /// has changed when an error is returned.
    pub async fn handle(
        &self,
        session: &mut ConnectionSession,
        event: ClientEvent,
    ) -> Result<(), GatewayError> {
        match event {
            ClientEvent::CreateThread => self.create_thread(session).await,
            ClientEvent::JoinThread(req) => self.join_thread(session, req).await,
            ClientEvent::SendNote(req) => self.send_note(session, req).await,
            ClientEvent::CloseThread(thread_id) => self.close_thread(session, &thread_id).await,
        }
    }

    /// Transport-level disconnect: leave the room, keep roster and thread.
    pub async fn disconnect(&self, session: &ConnectionSession) {
        let mut relay = self.relay.lock().await;
        let left = relay.rooms.leave(&session.id);
        tracing::info!(
            connection_id = %session.id,
            state = %session.state,
            thread_id = ?left,
            "Connection dropped"
        );
    }

    pub async fn stats(&self) -> RelayStats {
        let relay = self.relay.lock().await;
        RelayStats {
            open_threads: relay.registry.len(),
            connected_clients: relay.rooms.total_client_count(),
        }
    }

    async fn create_thread(&self, session: &mut ConnectionSession) -> Result<(), GatewayError> {
        session.require(ConnectionState::Unbound, "create a thread")?;

        let mut relay = self.relay.lock().await;
        let thread_id = relay.registry.create_thread()?;
        session.transition(ConnectionState::Instructor, "create a thread")?;
        session.thread = Some(thread_id);
        relay.rooms.join(thread_id, session.id, session.outbox.clone());
        session.send(ServerEvent::ThreadCreated(thread_id));

        tracing::info!(thread_id = %thread_id, connection_id = %session.id, "Thread created");
        Ok(())
    }

    async fn join_thread(
        &self,
        session: &mut ConnectionSession,
        req: JoinRequest,
    ) -> Result<(), GatewayError> {
        session.require(ConnectionState::Unbound, "join a thread")?;
        require_non_blank("threadId", &req.thread_id)?;
        require_non_blank("name", &req.name)?;
        require_non_blank("email", &req.email)?;
        // No thread can carry a malformed code.
        let thread_id = ThreadId::parse(req.thread_id.trim())
            .map_err(|_| GatewayError::NotFound(req.thread_id.trim().to_string()))?;

        let mut relay = self.relay.lock().await;
        let participant = Participant::new(req.name.clone(), req.email, session.id);
        let backfill = relay.registry.join_thread(&thread_id, participant)?;

        session.transition(ConnectionState::Student, "join a thread")?;
        session.thread = Some(thread_id);
        session.display_name = Some(req.name.clone());
        relay.rooms.join(thread_id, session.id, session.outbox.clone());

        session.send(ServerEvent::JoinedSuccess(backfill));
        relay
            .rooms
            .broadcast_to_thread(&thread_id, &ServerEvent::joined_notice(&req.name));

        tracing::info!(
            thread_id = %thread_id,
            connection_id = %session.id,
            members = relay.rooms.client_count(&thread_id),
            "Participant joined"
        );
        Ok(())
    }

    async fn send_note(
        &self,
        session: &mut ConnectionSession,
        req: NoteRequest,
    ) -> Result<(), GatewayError> {
        let thread_id = match (session.state, session.thread) {
            (ConnectionState::Instructor | ConnectionState::Student, Some(id)) => id,
            (ConnectionState::Terminated, _) => {
                tracing::debug!(connection_id = %session.id, "Note after closure dropped");
                return Ok(());
            }
            (state, _) => {
                return Err(GatewayError::InvalidState {
                    state,
                    action: "send a note",
                })
            }
        };
        require_non_blank("text", &req.text)?;

        if !req.thread_id.is_empty() && req.thread_id != thread_id.as_str() {
            tracing::debug!(
                connection_id = %session.id,
                thread_id = %thread_id,
                claimed = %req.thread_id,
                "Note addressed to another thread dropped"
            );
            return Ok(());
        }

        let author = self.author_for(session, &req.name);
        let mut relay = self.relay.lock().await;
        // The cached binding goes stale once the room closes; the code may
        // already belong to a new thread.
        if relay.rooms.thread_of(&session.id) != Some(thread_id) {
            tracing::debug!(
                thread_id = %thread_id,
                connection_id = %session.id,
                "Note dropped, thread closed before delivery"
            );
            session.transition(ConnectionState::Terminated, "send a note")?;
            return Ok(());
        }
        let appended = relay.registry.append_note(&thread_id, &author, &req.text);
        match appended {
            Ok(note) => {
                relay
                    .rooms
                    .broadcast_to_thread(&thread_id, &ServerEvent::ReceiveNote(note));
            }
            Err(e) => {
                tracing::debug!(
                    thread_id = %thread_id,
                    connection_id = %session.id,
                    error = %e,
                    "Note dropped, thread closed mid-flight"
                );
            }
        }
        Ok(())
    }

    async fn close_thread(
        &self,
        session: &mut ConnectionSession,
        claimed: &str,
    ) -> Result<(), GatewayError> {
        let thread_id = match (session.state, session.thread) {
            (ConnectionState::Instructor, Some(id)) => id,
            _ => {
                return Err(GatewayError::Forbidden(
                    "Only the thread's instructor can close it.".to_string(),
                ))
            }
        };
        if !claimed.is_empty() && claimed != thread_id.as_str() {
            return Err(GatewayError::Forbidden(
                "Cannot close a thread you did not create.".to_string(),
            ));
        }

        let mut relay = self.relay.lock().await;
        let snapshot = relay.registry.close_thread(&thread_id)?;
        let notes = snapshot.notes().len();
        self.archivist.submit(snapshot);

        let notified = relay
            .rooms
            .broadcast_to_thread(&thread_id, &ServerEvent::ThreadClosed);
        relay.rooms.close_room(&thread_id);
        session.transition(ConnectionState::Terminated, "close a thread")?;

        tracing::info!(
            thread_id = %thread_id,
            connection_id = %session.id,
            notes,
            notified,
            "Thread closed"
        );
        Ok(())
    }

    fn author_for(&self, session: &ConnectionSession, claimed: &str) -> String {
        match (session.state, &session.display_name) {
            (ConnectionState::Student, Some(name)) => name.clone(),
            _ if !claimed.trim().is_empty() => claimed.to_string(),
            _ => self.instructor_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::archive::InMemoryArchiveStore;
    use crate::domain::thread::{CandidateSource, ThreadIdAllocator};
    use std::sync::Arc;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    struct Fixed(ThreadId);

    impl CandidateSource for Fixed {
        fn next_candidate(&mut self) -> ThreadId {
            self.0
        }
    }

    fn gateway() -> (SessionGateway, InMemoryArchiveStore) {
        let store = InMemoryArchiveStore::new();
        let (archivist, _worker) = Archivist::spawn(Arc::new(store.clone()));
        let allocator = ThreadIdAllocator::new(Fixed(ThreadId::parse("4821").unwrap()), 4);
        (
            SessionGateway::new(ThreadRegistry::new(allocator), archivist, "SYSADMIN"),
            store,
        )
    }

    fn connect() -> (ConnectionSession, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = unbounded_channel();
        (ConnectionSession::new(tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn join(thread_id: &str, name: &str) -> ClientEvent {
        ClientEvent::JoinThread(JoinRequest {
            thread_id: thread_id.to_string(),
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
        })
    }

    fn note(thread_id: &str, text: &str) -> ClientEvent {
        ClientEvent::SendNote(NoteRequest {
            thread_id: thread_id.to_string(),
            name: String::new(),
            text: text.to_string(),
        })
    }

    #[tokio::test]
    async fn create_binds_instructor() {
        let (gw, _) = gateway();
        let (mut instructor, mut rx) = connect();

        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();

        assert_eq!(instructor.state(), ConnectionState::Instructor);
        assert_eq!(instructor.thread(), ThreadId::parse("4821").ok());
        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::ThreadCreated(ThreadId::parse("4821").unwrap())]
        );
    }

    #[tokio::test]
    async fn second_create_is_rejected() {
        let (gw, _) = gateway();
        let (mut instructor, _rx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();

        let err = gw
            .handle(&mut instructor, ClientEvent::CreateThread)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert_eq!(gw.stats().await.open_threads, 1);
    }

    #[tokio::test]
    async fn join_with_missing_field_stays_unbound() {
        let (gw, _) = gateway();
        let (mut student, _rx) = connect();

        let err = gw.handle(&mut student, join("4821", " ")).await.unwrap_err();

        assert_eq!(err, GatewayError::Validation(ValidationError::empty_field("name")));
        assert_eq!(student.state(), ConnectionState::Unbound);
    }

    #[tokio::test]
    async fn join_unknown_thread_reports_error_only() {
        let (gw, _) = gateway();
        let (mut student, mut rx) = connect();

        gw.dispatch(&mut student, join("0000", "Ann")).await;

        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::Error("Thread not found or closed.".to_string())]
        );
        assert_eq!(student.state(), ConnectionState::Unbound);
    }

    #[tokio::test]
    async fn join_malformed_code_reads_as_not_found() {
        let (gw, _) = gateway();
        let (mut student, mut rx) = connect();

        gw.dispatch(&mut student, join("48a1", "Ann")).await;

        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::Error("Thread not found or closed.".to_string())]
        );
        assert_eq!(student.state(), ConnectionState::Unbound);
    }

    #[tokio::test]
    async fn join_sends_backfill_then_notice_to_everyone() {
        let (gw, _) = gateway();
        let (mut instructor, mut instructor_rx) = connect();
        let (mut ann, mut ann_rx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        gw.handle(&mut instructor, note("4821", "welcome")).await.unwrap();
        drain(&mut instructor_rx);

        gw.handle(&mut ann, join("4821", "Ann")).await.unwrap();

        let ann_events = drain(&mut ann_rx);
        assert!(matches!(&ann_events[0], ServerEvent::JoinedSuccess(log) if log.len() == 1));
        assert_eq!(ann_events[1], ServerEvent::joined_notice("Ann"));
        assert_eq!(drain(&mut instructor_rx), vec![ServerEvent::joined_notice("Ann")]);
        assert_eq!(ann.state(), ConnectionState::Student);
    }

    #[tokio::test]
    async fn instructor_note_uses_configured_name() {
        let (gw, _) = gateway();
        let (mut instructor, mut rx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        drain(&mut rx);

        gw.handle(&mut instructor, note("4821", "hi")).await.unwrap();

        match drain(&mut rx).as_slice() {
            [ServerEvent::ReceiveNote(n)] => assert_eq!(n.name, "SYSADMIN"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn student_note_uses_registered_name() {
        let (gw, _) = gateway();
        let (mut instructor, _trx) = connect();
        let (mut ann, mut rx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        gw.handle(&mut ann, join("4821", "Ann")).await.unwrap();
        drain(&mut rx);

        gw.handle(
            &mut ann,
            ClientEvent::SendNote(NoteRequest {
                thread_id: "4821".to_string(),
                name: "Impostor".to_string(),
                text: "hello".to_string(),
            }),
        )
        .await
        .unwrap();

        match drain(&mut rx).as_slice() {
            [ServerEvent::ReceiveNote(n)] => {
                assert_eq!(n.name, "Ann");
                assert_eq!(n.text, "hello");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn blank_note_is_rejected_and_not_broadcast() {
        let (gw, _) = gateway();
        let (mut instructor, mut rx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        drain(&mut rx);

        gw.dispatch(&mut instructor, note("4821", "   ")).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::Error(_)));
    }

    #[tokio::test]
    async fn note_for_other_thread_is_dropped() {
        let (gw, _) = gateway();
        let (mut instructor, mut rx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        drain(&mut rx);

        gw.handle(&mut instructor, note("1234", "sneaky")).await.unwrap();

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn unbound_note_is_rejected() {
        let (gw, _) = gateway();
        let (mut stranger, _rx) = connect();

        let err = gw.handle(&mut stranger, note("4821", "hi")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn student_cannot_close() {
        let (gw, _) = gateway();
        let (mut instructor, _trx) = connect();
        let (mut ann, _arx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        gw.handle(&mut ann, join("4821", "Ann")).await.unwrap();

        let err = gw
            .handle(&mut ann, ClientEvent::CloseThread("4821".to_string()))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(gw.stats().await.open_threads, 1);
    }

    #[tokio::test]
    async fn close_with_foreign_id_is_forbidden() {
        let (gw, _) = gateway();
        let (mut instructor, _rx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();

        let err = gw
            .handle(&mut instructor, ClientEvent::CloseThread("1234".to_string()))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(instructor.state(), ConnectionState::Instructor);
    }

    #[tokio::test]
    async fn close_notifies_members_and_terminates() {
        let (gw, store) = gateway();
        let (mut instructor, mut trx) = connect();
        let (mut ann, mut arx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        gw.handle(&mut ann, join("4821", "Ann")).await.unwrap();
        drain(&mut trx);
        drain(&mut arx);

        gw.handle(&mut instructor, ClientEvent::CloseThread("4821".to_string()))
            .await
            .unwrap();

        assert_eq!(drain(&mut trx), vec![ServerEvent::ThreadClosed]);
        let events = drain(&mut arx);
        assert_eq!(events, vec![ServerEvent::ThreadClosed]);
        ann.observe(&events[0]);

        assert_eq!(instructor.state(), ConnectionState::Terminated);
        assert_eq!(ann.state(), ConnectionState::Terminated);
        assert_eq!(gw.stats().await, RelayStats { open_threads: 0, connected_clients: 0 });

        gw.archivist.flush().await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn stale_student_note_does_not_reach_reused_code() {
        let (gw, _) = gateway();
        let (mut first, _frx) = connect();
        let (mut ann, _arx) = connect();
        gw.handle(&mut first, ClientEvent::CreateThread).await.unwrap();
        gw.handle(&mut ann, join("4821", "Ann")).await.unwrap();
        gw.handle(&mut first, ClientEvent::CloseThread("4821".to_string()))
            .await
            .unwrap();

        // Ann has not drained thread-closed yet; the code is handed out again.
        let (mut second, mut srx) = connect();
        gw.handle(&mut second, ClientEvent::CreateThread).await.unwrap();
        assert_eq!(second.thread(), ThreadId::parse("4821").ok());
        drain(&mut srx);
        assert_eq!(ann.state(), ConnectionState::Student);

        gw.handle(&mut ann, note("4821", "from the old class"))
            .await
            .unwrap();

        assert!(drain(&mut srx).is_empty());
        assert_eq!(ann.state(), ConnectionState::Terminated);
        let relay = gw.relay.lock().await;
        let thread = relay.registry.get(&ThreadId::parse("4821").unwrap()).unwrap();
        assert!(thread.notes().is_empty());
    }

    #[tokio::test]
    async fn disconnect_keeps_thread_and_roster() {
        let (gw, _) = gateway();
        let (mut instructor, _trx) = connect();
        let (mut ann, _arx) = connect();
        gw.handle(&mut instructor, ClientEvent::CreateThread).await.unwrap();
        gw.handle(&mut ann, join("4821", "Ann")).await.unwrap();

        gw.disconnect(&instructor).await;
        gw.disconnect(&ann).await;

        let stats = gw.stats().await;
        assert_eq!(stats.open_threads, 1);
        assert_eq!(stats.connected_clients, 0);
        let relay = gw.relay.lock().await;
        let thread = relay.registry.get(&ThreadId::parse("4821").unwrap()).unwrap();
        assert_eq!(thread.participants().len(), 1);
    }

    #[test]
    fn thread_errors_map_to_gateway_errors() {
        let id = ThreadId::parse("4821").unwrap();
        assert_eq!(
            GatewayError::from(ThreadError::Inactive(id)),
            GatewayError::NotFound("4821".to_string())
        );
        assert_eq!(
            GatewayError::from(ThreadError::IdSpaceExhausted(9000)).code(),
            ErrorCode::IdSpaceExhausted
        );
    }
}
