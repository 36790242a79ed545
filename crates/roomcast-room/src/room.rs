//! Room and player records.

use roomcast_transport::ConnectionId;

/// A member of a room: the id the client chose, and the connection it
/// speaks through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub connection: ConnectionId,
}

/// A named group of players.
///
/// Invariants, maintained by [`RoomManager`](crate::RoomManager):
/// - `players` is never empty while the room is in the directory.
/// - `master_id` is the id of some player in `players`.
/// - player ids are unique within the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    name: String,
    master_id: String,
    players: Vec<Player>,
}

impl Room {
    /// Creates a room whose only player is also its master.
    pub(crate) fn new(name: String, founder: Player) -> Self {
        Self {
            name,
            master_id: founder.id.clone(),
            players: vec![founder],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn master_id(&self) -> &str {
        &self.master_id
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Connections in join order.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.players.iter().map(|p| p.connection)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub(crate) fn position_of(&self, connection: ConnectionId) -> Option<usize> {
        self.players.iter().position(|p| p.connection == connection)
    }

    pub(crate) fn push(&mut self, player: Player) {
        self.players.push(player);
    }

    /// Removes the player at `index` and, if they were master, hands the
    /// role to the first remaining player.
    ///
    /// Returns the removed player and the new master id when one was
    /// elected.
    pub(crate) fn remove_at(&mut self, index: usize) -> (Player, Option<String>) {
        let player = self.players.remove(index);
        let mut new_master = None;
        if player.id == self.master_id {
            if let Some(successor) = self.players.first() {
                self.master_id = successor.id.clone();
                new_master = Some(successor.id.clone());
            }
        }
        (player, new_master)
    }

    pub(crate) fn info(&self) -> RoomInfo {
        RoomInfo {
            name: self.name.clone(),
            master: self.master_id.clone(),
            player_count: self.players.len(),
        }
    }
}

/// A snapshot of a room, returned to callers after create/join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub name: String,
    pub master: String,
    pub player_count: usize,
}

/// What happened when a connection left its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The room the player left.
    pub room: String,
    /// The player that was removed.
    pub player: Player,
    /// Set when the leaver was master and a successor was elected.
    pub new_master: Option<String>,
    /// `true` when the room became empty and was removed.
    pub room_closed: bool,
}
