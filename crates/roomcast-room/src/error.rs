//! Error types for the room layer.

use roomcast_transport::ConnectionId;

/// Errors that can occur during room operations.
///
/// None of these are fatal: every variant leaves the directory exactly as
/// it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The request cannot be served as given, e.g. a room name shorter
    /// than the configured prefix length.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The room already has a player with this id.
    #[error("player {player_id} already in room {room}")]
    DuplicatePlayer { player_id: String, room: String },

    /// The connection is already a member of a room.
    #[error("{0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, String),

    /// The connection is not in any room.
    #[error("{0} is not in any room")]
    NotInRoom(ConnectionId),

    /// The directory's two indexes disagree. Indicates an earlier bug;
    /// logged and ignored.
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),
}

impl RoomError {
    /// Status code reported to the client in an `ERROR` envelope.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::DuplicatePlayer { .. } | Self::AlreadyInRoom(..) => 409,
            Self::NotInRoom(_) => 404,
            Self::ConsistencyViolation(_) => 500,
        }
    }
}
