//! Wire protocol for roomcast.
//!
//! - **Types** ([`Command`], [`ServerMessage`], [`Recipient`]): what
//!   clients send, what the server sends back, and who receives it.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! coordinator. It knows nothing about connections or rooms.
//!
//! ```text
//! Transport (bytes) → Protocol (Command) → Rooms (membership, routing)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    CREATE_ROOM, Command, JOIN_RANDOM_ROOM, JOIN_ROOM, MOVEMENT, Recipient,
    RoomRequest, ServerMessage,
};
