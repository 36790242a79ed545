//! Network plumbing for roomcast.
//!
//! Rooms never hold sockets. A client is known to the coordinator only by
//! its [`ConnectionId`]; everything that touches the wire sits behind the
//! [`Transport`] (listening side), [`PendingConnection`] (handshake) and
//! [`Connection`] (per-client side) traits defined here.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] on `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingUpgrade, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one client connection, unique for the life of the process.
///
/// Ordered so it can key sorted maps and give stable test output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Mostly useful in tests; transports call
    /// [`next`](Self::next).
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates an id no other connection in this process has had.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The listening side: hands out one [`PendingConnection`] per client.
pub trait Transport: Send + Sync + 'static {
    type Pending: PendingConnection;
    type Error: std::error::Error + Send + Sync;

    /// Resolves as soon as a peer is accepted at the socket level.
    ///
    /// No protocol handshake happens here, so a peer that never finishes
    /// one cannot hold up the peers behind it.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;
}

/// A peer that has connected but not yet completed its handshake.
pub trait PendingConnection: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Runs the handshake and yields the ready connection.
    async fn establish(self) -> Result<Self::Connection, Self::Error>;
}

/// One client, as a duplex stream of whole messages.
///
/// `send` and `recv` must be callable at the same time from different
/// tasks: the server parks a reader in `recv` while an outbox writer
/// calls `send`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one message.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Reads the next message. `Ok(None)` means the peer closed cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
