//! Room coordination for roomcast.
//!
//! Tracks which connection belongs to which room, elects a master per
//! room, and resolves broadcast targets. Everything here is synchronous
//! and I/O-free; the server owns a [`RoomManager`] behind a mutex and
//! does all sending after the lock is released.
//!
//! # Key types
//!
//! - [`RoomManager`]: create/join/leave, master election
//! - [`RoomDirectory`]: rooms by name plus the connection → room index
//! - [`Router`]: resolves a [`Recipient`](roomcast_protocol::Recipient)
//!   to connections
//! - [`RoomConfig`]: name prefix length, default room, random policy

mod config;
mod directory;
mod error;
mod manager;
mod room;
mod router;

pub use config::{
    DEFAULT_NAME_PREFIX_LEN, DEFAULT_ROOM_NAME, RandomRoomPolicy, RoomConfig,
};
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{Departure, Player, Room, RoomInfo};
pub use router::Router;
