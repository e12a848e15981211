//! WebSocket room management for thread-based message routing.
//!
//! Rooms are organized by thread code, allowing targeted broadcast of
//! relay events to every connection bound to one thread.
//!
//! # Architecture
//!
//! ```text
//! Room: 4821           Room: 1377
//! ├── conn-a           ├── conn-d
//! ├── conn-b           └── conn-e
//! └── conn-c
//! ```
//!
//! When a note lands in 4821, only connections a, b, c receive it.
//!
//! Each connection is reached through its own unbounded outbox, so a
//! broadcast is a non-blocking push onto every member's queue. The manager
//! has no interior locking; its owner serializes access.

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::foundation::{ConnectionId, ThreadId};

use super::messages::ServerEvent;

/// Sending half of one connection's outbound queue.
pub type Outbox = UnboundedSender<ServerEvent>;

/// Manages connection rooms organized by thread.
///
/// Provides:
/// - Connection join/leave operations
/// - Broadcast to all connections in a thread room
/// - Cleanup of empty rooms
#[derive(Default)]
pub struct RoomManager {
    /// Map of thread_id → members of that room.
    rooms: HashMap<ThreadId, HashMap<ConnectionId, Outbox>>,

    /// Map of connection_id → thread_id for O(1) cleanup on disconnect.
    client_threads: HashMap<ConnectionId, ThreadId>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a thread room, creating the room if needed.
    ///
    /// A connection belongs to at most one room; joining another moves it.
    pub fn join(&mut self, thread_id: ThreadId, connection_id: ConnectionId, outbox: Outbox) {
        self.leave(&connection_id);
        self.rooms
            .entry(thread_id)
            .or_default()
            .insert(connection_id, outbox);
        self.client_threads.insert(connection_id, thread_id);
    }

    /// Remove a connection from its room. Empty rooms are dropped.
    ///
    /// Returns the thread the connection was in, if any.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Option<ThreadId> {
        let thread_id = self.client_threads.remove(connection_id)?;
        if let Some(members) = self.rooms.get_mut(&thread_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(&thread_id);
            }
        }
        Some(thread_id)
    }

    /// Push an event to every connection in a thread room.
    ///
    /// Members whose outbox is closed (socket task already gone) are
    /// skipped. Returns the number of connections the event was queued for.
    pub fn broadcast_to_thread(&self, thread_id: &ThreadId, event: &ServerEvent) -> usize {
        self.rooms
            .get(thread_id)
            .map(|members| {
                members
                    .values()
                    .filter(|outbox| outbox.send(event.clone()).is_ok())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Drop a room and forget every member's binding to it.
    pub fn close_room(&mut self, thread_id: &ThreadId) {
        if let Some(members) = self.rooms.remove(thread_id) {
            for connection_id in members.keys() {
                self.client_threads.remove(connection_id);
            }
        }
    }

    /// Number of connections currently in a room (0 if it doesn't exist).
    pub fn client_count(&self, thread_id: &ThreadId) -> usize {
        self.rooms.get(thread_id).map(HashMap::len).unwrap_or(0)
    }

    /// Room the connection is currently in.
    ///
    /// `None` once the connection has left or its room was closed, even if
    /// the code has since been handed to a new thread.
    pub fn thread_of(&self, connection_id: &ConnectionId) -> Option<ThreadId> {
        self.client_threads.get(connection_id).copied()
    }

    /// Connections in any room.
    pub fn total_client_count(&self) -> usize {
        self.client_threads.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn thread(code: &str) -> ThreadId {
        ThreadId::parse(code).unwrap()
    }

    fn member() -> (ConnectionId, Outbox, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = unbounded_channel();
        (ConnectionId::new(), tx, rx)
    }

    #[test]
    fn join_creates_room_if_not_exists() {
        let mut manager = RoomManager::new();
        let (id, tx, _rx) = member();

        manager.join(thread("4821"), id, tx);

        assert_eq!(manager.thread_of(&id), Some(thread("4821")));
        assert_eq!(manager.client_count(&thread("4821")), 1);
    }

    #[test]
    fn broadcast_reaches_every_member_in_order() {
        let mut manager = RoomManager::new();
        let (a, tx_a, mut rx_a) = member();
        let (b, tx_b, mut rx_b) = member();
        manager.join(thread("4821"), a, tx_a);
        manager.join(thread("4821"), b, tx_b);

        let first = ServerEvent::SystemMessage("one".to_string());
        let second = ServerEvent::SystemMessage("two".to_string());
        assert_eq!(manager.broadcast_to_thread(&thread("4821"), &first), 2);
        manager.broadcast_to_thread(&thread("4821"), &second);

        for rx in [&mut rx_a, &mut rx_b] {
            assert_eq!(rx.try_recv().unwrap(), first);
            assert_eq!(rx.try_recv().unwrap(), second);
        }
    }

    #[test]
    fn rooms_are_isolated() {
        let mut manager = RoomManager::new();
        let (a, tx_a, mut rx_a) = member();
        let (b, tx_b, mut rx_b) = member();
        manager.join(thread("1111"), a, tx_a);
        manager.join(thread("2222"), b, tx_b);

        manager.broadcast_to_thread(&thread("1111"), &ServerEvent::ThreadClosed);

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn leave_cleans_up_empty_room() {
        let mut manager = RoomManager::new();
        let (a, tx_a, _rx) = member();
        manager.join(thread("4821"), a, tx_a);

        assert_eq!(manager.leave(&a), Some(thread("4821")));
        assert_eq!(manager.client_count(&thread("4821")), 0);
        assert_eq!(manager.thread_of(&a), None);
        assert_eq!(manager.total_client_count(), 0);
        assert_eq!(manager.leave(&a), None);
    }

    #[test]
    fn closed_outboxes_are_skipped() {
        let mut manager = RoomManager::new();
        let (a, tx_a, rx_a) = member();
        let (b, tx_b, _rx_b) = member();
        manager.join(thread("4821"), a, tx_a);
        manager.join(thread("4821"), b, tx_b);
        drop(rx_a);

        assert_eq!(
            manager.broadcast_to_thread(&thread("4821"), &ServerEvent::ThreadClosed),
            1
        );
    }

    #[test]
    fn close_room_unbinds_all_members() {
        let mut manager = RoomManager::new();
        let (a, tx_a, _rx_a) = member();
        let (b, tx_b, _rx_b) = member();
        manager.join(thread("4821"), a, tx_a);
        manager.join(thread("4821"), b, tx_b);

        manager.close_room(&thread("4821"));

        assert_eq!(manager.thread_of(&b), None);
        assert_eq!(manager.client_count(&thread("4821")), 0);
        assert_eq!(manager.total_client_count(), 0);
        assert_eq!(manager.leave(&a), None);
    }

    #[test]
    fn rejoining_moves_the_binding() {
        let mut manager = RoomManager::new();
        let (a, tx_a, _rx) = member();
        manager.join(thread("1111"), a, tx_a.clone());
        manager.join(thread("2222"), a, tx_a);

        assert_eq!(manager.thread_of(&a), Some(thread("2222")));
        assert_eq!(manager.client_count(&thread("1111")), 0);
    }

    #[test]
    fn broadcast_to_nonexistent_room_is_noop() {
        let manager = RoomManager::new();
        assert_eq!(
            manager.broadcast_to_thread(&thread("9999"), &ServerEvent::ThreadClosed),
            0
        );
    }
}
