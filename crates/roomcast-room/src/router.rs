//! Broadcast routing: turns a [`Recipient`] into a concrete set of
//! connections.
//!
//! The router only reads membership. Callers resolve targets while they
//! hold the manager lock and deliver after releasing it, so the returned
//! `Vec` is a snapshot that later joins and leaves do not affect.

use roomcast_protocol::Recipient;
use roomcast_transport::ConnectionId;

use crate::RoomDirectory;

/// Resolves recipients against a directory.
#[derive(Debug, Clone, Copy)]
pub struct Router<'a> {
    directory: &'a RoomDirectory,
}

impl<'a> Router<'a> {
    pub fn new(directory: &'a RoomDirectory) -> Self {
        Self { directory }
    }

    /// Connections that should receive a message sent by `sender` to
    /// `recipient`, in room join order.
    ///
    /// `Room` and `Others` resolve to nothing when the sender is not in a
    /// room; `Sender` always resolves to the sender.
    pub fn targets(
        &self,
        sender: ConnectionId,
        recipient: &Recipient,
    ) -> Vec<ConnectionId> {
        match recipient {
            Recipient::Sender => vec![sender],
            Recipient::Room => self
                .directory
                .room_of(sender)
                .map(|room| room.connections().collect())
                .unwrap_or_default(),
            Recipient::Others => self
                .directory
                .room_of(sender)
                .map(|room| {
                    room.connections().filter(|c| *c != sender).collect()
                })
                .unwrap_or_default(),
            Recipient::RoomNamed(name) => self
                .directory
                .room(name)
                .map(|room| room.connections().collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoomConfig, RoomManager};

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// Room "shua" with connections 1, 2, 3 in join order, and room
    /// "lobb" with connection 4.
    fn manager() -> RoomManager {
        let mut rooms = RoomManager::new(RoomConfig::default());
        rooms.create_room(conn(1), "shuashua", "a").unwrap();
        rooms.join_room(conn(2), "shua", "b").unwrap();
        rooms.join_room(conn(3), "shua", "c").unwrap();
        rooms.create_room(conn(4), "lobby", "d").unwrap();
        rooms
    }

    #[test]
    fn test_room_includes_sender_in_join_order() {
        let rooms = manager();
        assert_eq!(
            rooms.router().targets(conn(2), &Recipient::Room),
            vec![conn(1), conn(2), conn(3)]
        );
    }

    #[test]
    fn test_others_excludes_sender() {
        let rooms = manager();
        assert_eq!(
            rooms.router().targets(conn(2), &Recipient::Others),
            vec![conn(1), conn(3)]
        );
        assert!(rooms.router().targets(conn(4), &Recipient::Others).is_empty());
    }

    #[test]
    fn test_unbound_sender_reaches_nobody_but_itself() {
        let rooms = manager();
        let router = rooms.router();
        assert!(router.targets(conn(9), &Recipient::Room).is_empty());
        assert!(router.targets(conn(9), &Recipient::Others).is_empty());
        assert_eq!(router.targets(conn(9), &Recipient::Sender), vec![conn(9)]);
    }

    #[test]
    fn test_room_named_ignores_sender_membership() {
        let rooms = manager();
        let router = rooms.router();
        assert_eq!(
            router.targets(conn(1), &Recipient::RoomNamed("lobb".into())),
            vec![conn(4)]
        );
        assert!(router
            .targets(conn(1), &Recipient::RoomNamed("gone".into()))
            .is_empty());
    }
}
