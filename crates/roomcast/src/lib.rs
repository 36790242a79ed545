//! # roomcast
//!
//! Room-based WebSocket relay for small multiplayer sessions.
//!
//! Clients connect, create or join named rooms, and send messages that the
//! server fans out to the other members of their room. Each room has a
//! master; when the master disconnects, the longest-standing remaining
//! player takes over.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcast::prelude::*;
//!
//! # async fn run() -> Result<(), RoomcastError> {
//! let server = RoomcastServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Commands
//!
//! | Command | Effect |
//! |---|---|
//! | `CREATE_ROOM` | create a room (joins it if the name is taken), `ROOM_JOINED` to sender |
//! | `JOIN_ROOM` | join a room (creates it if missing), `ROOM_JOINED` to sender |
//! | `JOIN_RANDOM_ROOM` | join any room (or create the default one) |
//! | `MOVEMENT` | relayed to every other room member |
//! | anything else | relayed to every room member, sender included |

mod config;
mod dispatch;
mod error;
mod handler;
mod outbox;
mod server;

pub use config::{
    DEFAULT_BIND_ADDR, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_OUTBOX_CAPACITY,
    DEFAULT_WS_PATH, ServerConfig,
};
pub use dispatch::Dispatcher;
pub use error::RoomcastError;
pub use outbox::{Outbound, Payload};
pub use server::{RoomcastServer, RoomcastServerBuilder};

pub mod prelude {
    pub use crate::{
        Dispatcher, Outbound, RoomcastError, RoomcastServer,
        RoomcastServerBuilder, ServerConfig,
    };
    pub use roomcast_protocol::{
        Codec, Command, JsonCodec, ProtocolError, Recipient, ServerMessage,
    };
    pub use roomcast_room::{
        RandomRoomPolicy, Room, RoomConfig, RoomError, RoomManager,
    };
    pub use roomcast_transport::ConnectionId;
}
