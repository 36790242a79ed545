//! Protocol types for roomcast's wire format.
//!
//! Inbound frames are JSON objects with a `command` name, an optional
//! `player_id`, and an optional `data` object. Only the room commands are
//! interpreted; every other command is relayed byte-for-byte, so this
//! module decodes the narrowest view that routing needs and nothing more.

use serde::{Deserialize, Serialize};

use crate::{Codec, ProtocolError};

/// Command name: create a room from a requested name.
pub const CREATE_ROOM: &str = "CREATE_ROOM";
/// Command name: join a room by name (creates it when missing).
pub const JOIN_ROOM: &str = "JOIN_ROOM";
/// Command name: join any existing room.
pub const JOIN_RANDOM_ROOM: &str = "JOIN_RANDOM_ROOM";
/// Command name: high-frequency movement update, relayed to other members.
pub const MOVEMENT: &str = "MOVEMENT";

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive an outbound message, relative to the
/// connection that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every member of the sender's room, sender included.
    Room,

    /// Every member of the sender's room except the sender.
    Others,

    /// Only the sender.
    Sender,

    /// Every member of the named room. Used after the sender has already
    /// left and no longer resolves to a room.
    RoomNamed(String),
}

// ---------------------------------------------------------------------------
// ServerMessage: envelopes produced by the coordinator
// ---------------------------------------------------------------------------

/// Envelopes the server emits on its own behalf.
///
/// Serialized with the command name in the `command` field, the same
/// field clients use for their own commands:
///
/// ```text
/// {"command":"ROOM_JOINED","roomName":"shua","master":"alice","playerCount":1}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Sent to the sender after a successful create or join.
    RoomJoined {
        #[serde(rename = "roomName")]
        room_name: String,
        master: String,
        #[serde(rename = "playerCount")]
        player_count: usize,
    },

    /// Sent to the remaining members after a player disconnects.
    PlayerLeft { player_id: String },

    /// Sent to the remaining members after the master disconnects and a
    /// successor has been elected.
    NewMaster { master: String },

    /// Sent to the sender when a request was rejected.
    /// Codes follow HTTP conventions: 400 bad request, 409 conflict.
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Command: validated inbound commands
// ---------------------------------------------------------------------------

/// The fields every room command carries once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRequest {
    /// Client-chosen player id, trusted as-is.
    pub player_id: String,
    /// Requested room name, before any prefix derivation.
    pub room_name: String,
}

/// An inbound command, validated once at the decode boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateRoom(RoomRequest),
    JoinRoom(RoomRequest),
    JoinRandomRoom { player_id: String },
    Movement,
    /// Any other command name. The original frame is relayed unchanged.
    Relay { name: String },
}

#[derive(Deserialize)]
struct Header {
    command: String,
}

#[derive(Deserialize)]
struct RoomEnvelope {
    #[serde(default)]
    player_id: Option<String>,
    #[serde(default)]
    data: Option<RoomData>,
}

#[derive(Deserialize)]
struct RoomData {
    #[serde(default, rename = "roomName")]
    room_name: Option<String>,
}

impl Command {
    /// Decodes and validates an inbound frame.
    ///
    /// # Errors
    /// - `ProtocolError::Decode` if the frame is not an object with a
    ///   string `command`, or a room command has fields of the wrong type.
    /// - `ProtocolError::InvalidRequest` if a room command is missing
    ///   `player_id` or `data.roomName`.
    pub fn decode<C: Codec>(
        codec: &C,
        data: &[u8],
    ) -> Result<Self, ProtocolError> {
        let header: Header = codec.decode(data)?;

        match header.command.as_str() {
            CREATE_ROOM => {
                Ok(Self::CreateRoom(room_request(codec, data)?))
            }
            JOIN_ROOM => {
                Ok(Self::JoinRoom(room_request(codec, data)?))
            }
            JOIN_RANDOM_ROOM => {
                let envelope: RoomEnvelope = codec.decode(data)?;
                let player_id = required(envelope.player_id, "player_id")?;
                Ok(Self::JoinRandomRoom { player_id })
            }
            MOVEMENT => Ok(Self::Movement),
            _ => Ok(Self::Relay {
                name: header.command,
            }),
        }
    }

    /// The wire name of this command.
    pub fn name(&self) -> &str {
        match self {
            Self::CreateRoom(_) => CREATE_ROOM,
            Self::JoinRoom(_) => JOIN_ROOM,
            Self::JoinRandomRoom { .. } => JOIN_RANDOM_ROOM,
            Self::Movement => MOVEMENT,
            Self::Relay { name } => name,
        }
    }
}

fn room_request<C: Codec>(
    codec: &C,
    data: &[u8],
) -> Result<RoomRequest, ProtocolError> {
    let envelope: RoomEnvelope = codec.decode(data)?;
    let player_id = required(envelope.player_id, "player_id")?;
    let room_name =
        required(envelope.data.and_then(|d| d.room_name), "data.roomName")?;
    Ok(RoomRequest {
        player_id,
        room_name,
    })
}

fn required(
    value: Option<String>,
    field: &str,
) -> Result<String, ProtocolError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ProtocolError::InvalidRequest(format!(
            "missing required field `{field}`"
        ))),
    }
}
