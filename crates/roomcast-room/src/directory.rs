//! The room directory: every live room, and which room each connection
//! belongs to.
//!
//! The directory is a plain pair of maps with no locking of its own. It
//! is only reachable through [`RoomManager`](crate::RoomManager), which
//! the server keeps behind a single mutex, so the two maps are always
//! observed and updated together.

use std::collections::{BTreeMap, HashMap};

use roomcast_transport::ConnectionId;

use crate::Room;

/// Rooms by name, plus the inverse index from connection to room name.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    /// Ordered so that "first room by name" needs no sort.
    rooms: BTreeMap<String, Room>,

    /// A connection is in at most one room at a time.
    bindings: HashMap<ConnectionId, String>,
}

impl RoomDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The room a connection is bound to.
    pub fn room_of(&self, connection: ConnectionId) -> Option<&Room> {
        self.bindings
            .get(&connection)
            .and_then(|name| self.rooms.get(name))
    }

    /// The name a connection is bound to, whether or not that room exists.
    pub fn room_name_of(&self, connection: ConnectionId) -> Option<&str> {
        self.bindings.get(&connection).map(String::as_str)
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    pub(crate) fn room_mut(&mut self, name: &str) -> Option<&mut Room> {
        self.rooms.get_mut(name)
    }

    /// Inserts a room under its own name, returning any room it replaced.
    pub(crate) fn put(&mut self, room: Room) -> Option<Room> {
        self.rooms.insert(room.name().to_string(), room)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Room> {
        self.rooms.remove(name)
    }

    /// Binds a connection to a room name, returning the previous binding.
    pub(crate) fn bind(
        &mut self,
        connection: ConnectionId,
        name: &str,
    ) -> Option<String> {
        self.bindings.insert(connection, name.to_string())
    }

    pub(crate) fn unbind(&mut self, connection: ConnectionId) -> Option<String> {
        self.bindings.remove(&connection)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    /// Room names in sorted order.
    pub fn room_names(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Number of bound connections.
    pub fn bound_connections(&self) -> usize {
        self.bindings.len()
    }

    /// Checks every directory invariant, returning a description of the
    /// first one that does not hold.
    ///
    /// Linear in the number of players; meant for tests and debug
    /// assertions, not the hot path.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut members = 0;
        for (name, room) in &self.rooms {
            if room.name() != name {
                return Err(format!("room {} filed under {name}", room.name()));
            }
            if room.players().is_empty() {
                return Err(format!("room {name} is empty"));
            }
            if !room.has_player(room.master_id()) {
                return Err(format!(
                    "room {name} master {} is not a member",
                    room.master_id()
                ));
            }
            for player in room.players() {
                members += 1;
                if self.bindings.get(&player.connection) != Some(name) {
                    return Err(format!(
                        "{} in room {name} is not bound to it",
                        player.connection
                    ));
                }
            }
        }
        if members != self.bindings.len() {
            return Err(format!(
                "{} bindings for {members} room members",
                self.bindings.len()
            ));
        }
        Ok(())
    }
}
