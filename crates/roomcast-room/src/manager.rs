//! Room manager: membership changes and master election.
//!
//! Every mutation of the [`RoomDirectory`] goes through here. The manager
//! does no I/O and never blocks, so the server can hold it behind one
//! mutex without stalling on a socket.

use rand::seq::IteratorRandom;
use roomcast_transport::ConnectionId;

use crate::{
    Departure, Player, RandomRoomPolicy, Room, RoomConfig, RoomDirectory,
    RoomError, RoomInfo, Router,
};

/// Manages all active rooms and tracks which connection is in which room.
#[derive(Debug, Default)]
pub struct RoomManager {
    directory: RoomDirectory,
    config: RoomConfig,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            directory: RoomDirectory::new(),
            config,
        }
    }

    /// Read-only view of the directory.
    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    /// A router over the current membership.
    pub fn router(&self) -> Router<'_> {
        Router::new(&self.directory)
    }

    /// Derives the room name for a requested name: its first
    /// `name_prefix_len` characters.
    ///
    /// # Errors
    /// [`RoomError::InvalidRequest`] if the name is shorter than the prefix,
    /// or the configured prefix length is zero.
    pub fn derive_room_name(&self, requested: &str) -> Result<String, RoomError> {
        let len = self.config.name_prefix_len;
        if len == 0 {
            return Err(RoomError::InvalidRequest(
                "room name prefix length is zero".into(),
            ));
        }
        let derived: String = requested.chars().take(len).collect();
        if derived.chars().count() < len {
            return Err(RoomError::InvalidRequest(format!(
                "room name {requested:?} is shorter than {len} characters"
            )));
        }
        Ok(derived)
    }

    /// Creates a room named after the first characters of
    /// `requested_name`, with the caller as its only player and master.
    ///
    /// If the derived name is already taken the caller joins that room
    /// instead; the existing room is never replaced.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] if the connection is in a room.
    /// - [`RoomError::InvalidRequest`] if the name is too short.
    /// - [`RoomError::DuplicatePlayer`] when joining an existing room that
    ///   already has `player_id`.
    pub fn create_room(
        &mut self,
        connection: ConnectionId,
        requested_name: &str,
        player_id: &str,
    ) -> Result<RoomInfo, RoomError> {
        self.ensure_unbound(connection)?;
        let name = self.derive_room_name(requested_name)?;

        if self.directory.contains(&name) {
            tracing::debug!(
                room = %name,
                player = %player_id,
                "room name taken, joining existing room"
            );
            return self.admit(connection, &name, player_id);
        }

        let room = Room::new(
            name.clone(),
            Player {
                id: player_id.to_string(),
                connection,
            },
        );
        let info = room.info();
        self.directory.put(room);
        self.directory.bind(connection, &name);

        tracing::info!(room = %name, player = %player_id, %connection, "room created");
        Ok(info)
    }

    /// Adds the caller to `room_name`, or creates the room when it does
    /// not exist.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] if the connection is in a room.
    /// - [`RoomError::DuplicatePlayer`] if the room already has `player_id`.
    /// - [`RoomError::InvalidRequest`] if the create fallback gets a name
    ///   that is too short.
    pub fn join_room(
        &mut self,
        connection: ConnectionId,
        room_name: &str,
        player_id: &str,
    ) -> Result<RoomInfo, RoomError> {
        self.ensure_unbound(connection)?;
        if self.directory.contains(room_name) {
            self.admit(connection, room_name, player_id)
        } else {
            self.create_room(connection, room_name, player_id)
        }
    }

    /// Joins a room chosen by the configured [`RandomRoomPolicy`], or
    /// creates the default room when there are none.
    ///
    /// # Errors
    /// Same as [`join_room`](Self::join_room).
    pub fn join_random_room(
        &mut self,
        connection: ConnectionId,
        player_id: &str,
    ) -> Result<RoomInfo, RoomError> {
        self.ensure_unbound(connection)?;
        match self.pick_room() {
            Some(name) => {
                tracing::debug!(
                    room = %name,
                    player = %player_id,
                    "picked room for random join"
                );
                self.join_room(connection, &name, player_id)
            }
            None => {
                let name = self.config.default_room_name.clone();
                self.create_room(connection, &name, player_id)
            }
        }
    }

    /// Removes a connection from its room.
    ///
    /// If the leaver was master, the first remaining player becomes
    /// master. A room left empty is removed from the directory.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`] if the connection is not bound (it never
    ///   joined, or already left).
    /// - [`RoomError::ConsistencyViolation`] if the connection is bound to
    ///   a room that does not list it. Nothing is changed.
    pub fn leave_room(
        &mut self,
        connection: ConnectionId,
    ) -> Result<Departure, RoomError> {
        let name = self
            .directory
            .room_name_of(connection)
            .ok_or(RoomError::NotInRoom(connection))?
            .to_string();

        let room = self.directory.room_mut(&name).ok_or_else(|| {
            RoomError::ConsistencyViolation(format!(
                "{connection} is bound to missing room {name}"
            ))
        })?;
        let index = room.position_of(connection).ok_or_else(|| {
            RoomError::ConsistencyViolation(format!(
                "{connection} is bound to room {name} but not among its players"
            ))
        })?;

        let (player, new_master) = room.remove_at(index);
        let room_closed = room.players().is_empty();
        self.directory.unbind(connection);

        tracing::info!(room = %name, player = %player.id, %connection, "player left");
        if let Some(master) = &new_master {
            tracing::info!(room = %name, %master, "master handed over");
        }
        if room_closed {
            self.directory.remove(&name);
            tracing::info!(room = %name, "room empty, removed");
        }

        Ok(Departure {
            room: name,
            player,
            new_master,
            room_closed,
        })
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.directory.len()
    }

    /// Lists active room names in sorted order.
    pub fn room_names(&self) -> Vec<String> {
        self.directory.room_names().map(str::to_string).collect()
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.directory.room(name)
    }

    /// The room a connection is currently in, if any.
    pub fn room_of(&self, connection: ConnectionId) -> Option<&Room> {
        self.directory.room_of(connection)
    }

    fn ensure_unbound(&self, connection: ConnectionId) -> Result<(), RoomError> {
        match self.directory.room_name_of(connection) {
            Some(current) => Err(RoomError::AlreadyInRoom(
                connection,
                current.to_string(),
            )),
            None => Ok(()),
        }
    }

    /// Appends a player to an existing room and binds the connection.
    fn admit(
        &mut self,
        connection: ConnectionId,
        name: &str,
        player_id: &str,
    ) -> Result<RoomInfo, RoomError> {
        let room = self.directory.room_mut(name).ok_or_else(|| {
            RoomError::ConsistencyViolation(format!("room {name} vanished during join"))
        })?;
        if room.has_player(player_id) {
            return Err(RoomError::DuplicatePlayer {
                player_id: player_id.to_string(),
                room: name.to_string(),
            });
        }

        room.push(Player {
            id: player_id.to_string(),
            connection,
        });
        let info = room.info();
        self.directory.bind(connection, name);

        tracing::info!(
            room = %name,
            player = %player_id,
            %connection,
            players = info.player_count,
            "player joined"
        );
        Ok(info)
    }

    fn pick_room(&self) -> Option<String> {
        let mut names = self.directory.room_names();
        let picked = match self.config.random_policy {
            RandomRoomPolicy::FirstByName => names.next(),
            RandomRoomPolicy::Uniform => names.choose(&mut rand::rng()),
        };
        picked.map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_derive_room_name_takes_prefix() {
        let mgr = RoomManager::default();
        assert_eq!(mgr.derive_room_name("shuashua").unwrap(), "shua");
        assert_eq!(mgr.derive_room_name("shua").unwrap(), "shua");
    }

    #[test]
    fn test_derive_room_name_counts_characters_not_bytes() {
        let mgr = RoomManager::default();
        assert_eq!(mgr.derive_room_name("äöüßxyz").unwrap(), "äöüß");
        assert!(mgr.derive_room_name("äöü").is_err());
    }

    #[test]
    fn test_short_name_is_invalid_and_changes_nothing() {
        let mut mgr = RoomManager::default();
        let err = mgr.create_room(conn(1), "abc", "alice").unwrap_err();
        assert!(matches!(err, RoomError::InvalidRequest(_)));
        assert_eq!(err.code(), 400);
        assert_eq!(mgr.room_count(), 0);
        assert!(mgr.room_of(conn(1)).is_none());
    }

    #[test]
    fn test_custom_prefix_length() {
        let mgr = RoomManager::new(RoomConfig {
            name_prefix_len: 2,
            ..RoomConfig::default()
        });
        assert_eq!(mgr.derive_room_name("lobby").unwrap(), "lo");
    }

    #[test]
    fn test_zero_prefix_never_yields_empty_room() {
        let mut mgr = RoomManager::new(RoomConfig {
            name_prefix_len: 0,
            ..RoomConfig::default()
        });
        let err = mgr
            .create_room(ConnectionId::new(1), "lobby", "alice")
            .unwrap_err();
        assert!(matches!(err, RoomError::InvalidRequest(_)));
        assert_eq!(mgr.room_count(), 0);
        assert!(mgr.room("").is_none());
    }

    #[test]
    fn test_first_by_name_picks_lowest_name() {
        let mut mgr = RoomManager::new(RoomConfig {
            random_policy: RandomRoomPolicy::FirstByName,
            ..RoomConfig::default()
        });
        mgr.create_room(conn(1), "zulu", "a").unwrap();
        mgr.create_room(conn(2), "alfa", "b").unwrap();
        assert_eq!(mgr.pick_room().as_deref(), Some("alfa"));
    }

    #[test]
    fn test_uniform_pick_returns_an_existing_room() {
        let mut mgr = RoomManager::default();
        assert!(mgr.pick_room().is_none());
        mgr.create_room(conn(1), "zulu", "a").unwrap();
        mgr.create_room(conn(2), "alfa", "b").unwrap();
        for _ in 0..20 {
            let picked = mgr.pick_room().unwrap();
            assert!(picked == "zulu" || picked == "alfa");
        }
    }
}
