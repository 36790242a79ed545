//! Command dispatch: maps inbound frames and disconnects to room
//! operations and the messages they produce.
//!
//! Each call takes the room lock, applies one operation, resolves targets,
//! and queues the resulting [`Outbound`] messages on the per-connection
//! outboxes before the lock is released. Every client therefore sees
//! messages about a room in the order the room changed. Queueing is a
//! non-blocking `try_send`; the socket writes happen later on each
//! connection's writer task, outside the critical section.
//!
//! The queued messages are also returned, which keeps the command surface
//! testable without sockets.

use roomcast_protocol::{Codec, Command, Recipient, ServerMessage};
use roomcast_room::{RoomConfig, RoomError, RoomInfo, RoomManager};
use roomcast_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::Outbound;
use crate::config::DEFAULT_OUTBOX_CAPACITY;
use crate::outbox::Outboxes;

/// Routes commands from every connection through one shared
/// [`RoomManager`].
pub struct Dispatcher<C: Codec> {
    rooms: Mutex<RoomManager>,
    outboxes: Outboxes,
    codec: C,
}

impl<C: Codec> Dispatcher<C> {
    pub fn new(config: RoomConfig, codec: C) -> Self {
        Self {
            rooms: Mutex::new(RoomManager::new(config)),
            outboxes: Outboxes::new(DEFAULT_OUTBOX_CAPACITY),
            codec,
        }
    }

    /// Sets how many messages may queue for one connection.
    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outboxes = Outboxes::new(capacity);
        self
    }

    pub(crate) fn outboxes(&self) -> &Outboxes {
        &self.outboxes
    }

    /// Locks the room state, e.g. for inspection in tests or admin tools.
    pub async fn rooms(&self) -> tokio::sync::MutexGuard<'_, RoomManager> {
        self.rooms.lock().await
    }

    /// Handles one inbound frame from `sender` and queues the results.
    ///
    /// Returns the messages that were queued.
    pub async fn handle_message(
        &self,
        sender: ConnectionId,
        data: &[u8],
    ) -> Vec<Outbound> {
        let command = match Command::decode(&self.codec, data) {
            Ok(command) => command,
            Err(e) if e.is_decode() => {
                tracing::debug!(%sender, error = %e, "dropping undecodable message");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(%sender, error = %e, "rejecting invalid request");
                let outbound = self.reject(sender, 400, &e.to_string());
                self.outboxes.deliver(&outbound).await;
                return outbound;
            }
        };

        tracing::trace!(%sender, command = command.name(), "dispatching");

        let mut rooms = self.rooms.lock().await;
        let outbound = match command {
            Command::CreateRoom(req) => self.joined(
                sender,
                rooms.create_room(sender, &req.room_name, &req.player_id),
            ),
            Command::JoinRoom(req) => self.joined(
                sender,
                rooms.join_room(sender, &req.room_name, &req.player_id),
            ),
            Command::JoinRandomRoom { player_id } => {
                self.joined(sender, rooms.join_random_room(sender, &player_id))
            }
            Command::Movement => relay(&rooms, sender, Recipient::Others, data),
            Command::Relay { .. } => relay(&rooms, sender, Recipient::Room, data),
        };
        // Queue before the guard drops so per-room order is preserved.
        self.outboxes.deliver(&outbound).await;
        drop(rooms);
        outbound
    }

    /// Handles a closed connection: removes it from its room and notifies
    /// the members left behind.
    ///
    /// If the leaver was master, `NEW_MASTER` goes out first. `PLAYER_LEFT`
    /// follows whenever the room survives. Returns the messages that were
    /// queued.
    pub async fn handle_close(&self, connection: ConnectionId) -> Vec<Outbound> {
        let mut rooms = self.rooms.lock().await;
        let departure = match rooms.leave_room(connection) {
            Ok(departure) => departure,
            Err(RoomError::NotInRoom(_)) => {
                tracing::debug!(%connection, "closed connection was not in a room");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(%connection, error = %e, "leave failed, ignoring");
                return Vec::new();
            }
        };
        let targets = rooms
            .router()
            .targets(connection, &Recipient::RoomNamed(departure.room.clone()));

        if departure.room_closed || targets.is_empty() {
            return Vec::new();
        }

        let mut outbound = Vec::with_capacity(2);
        if let Some(master) = departure.new_master {
            outbound.extend(
                self.envelope(targets.clone(), &ServerMessage::NewMaster { master }),
            );
        }
        outbound.extend(self.envelope(
            targets,
            &ServerMessage::PlayerLeft {
                player_id: departure.player.id,
            },
        ));
        self.outboxes.deliver(&outbound).await;
        drop(rooms);
        outbound
    }

    /// Acknowledges a create/join to the sender, or rejects it.
    fn joined(
        &self,
        sender: ConnectionId,
        result: Result<RoomInfo, RoomError>,
    ) -> Vec<Outbound> {
        match result {
            Ok(info) => self
                .envelope(
                    vec![sender],
                    &ServerMessage::RoomJoined {
                        room_name: info.name,
                        master: info.master,
                        player_count: info.player_count,
                    },
                )
                .into_iter()
                .collect(),
            Err(e) => {
                tracing::warn!(%sender, error = %e, "room request rejected");
                self.reject(sender, e.code(), &e.to_string())
            }
        }
    }

    fn reject(&self, sender: ConnectionId, code: u16, message: &str) -> Vec<Outbound> {
        self.envelope(
            vec![sender],
            &ServerMessage::Error {
                code,
                message: message.to_string(),
            },
        )
        .into_iter()
        .collect()
    }

    fn envelope(
        &self,
        targets: Vec<ConnectionId>,
        msg: &ServerMessage,
    ) -> Option<Outbound> {
        match self.codec.encode(msg) {
            Ok(bytes) => Some(Outbound::new(targets, bytes)),
            Err(e) => {
                tracing::error!(error = %e, ?msg, "failed to encode server message");
                None
            }
        }
    }
}

/// Forwards the original frame unchanged.
fn relay(
    rooms: &RoomManager,
    sender: ConnectionId,
    recipient: Recipient,
    data: &[u8],
) -> Vec<Outbound> {
    let targets = rooms.router().targets(sender, &recipient);
    if targets.is_empty() {
        tracing::debug!(%sender, ?recipient, "nothing to relay to");
        return Vec::new();
    }
    vec![Outbound::new(targets, data)]
}
