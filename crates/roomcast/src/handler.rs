//! Per-connection handler: read loop, outbox writer, and cleanup.
//!
//! Each accepted peer gets its own Tokio task running this handler.
//! The flow is:
//!   1. Finish the WebSocket upgrade
//!   2. Open an outbox and spawn a writer task that drains it
//!   3. Loop: receive frames → dispatcher (which queues the results)
//!   4. On close, error, or idle timeout: leave the room, notify the
//!      remaining members, close the outbox

use std::sync::Arc;

use roomcast_protocol::Codec;
use roomcast_transport::{
    Connection, ConnectionId, PendingConnection, PendingUpgrade,
    WebSocketConnection,
};
use tokio::sync::mpsc;

use crate::RoomcastError;
use crate::outbox::Payload;
use crate::server::ServerState;

/// Drop guard that runs disconnect handling when the handler exits.
///
/// This ensures the player leaves its room even if the handler panics.
/// Since `Drop` is synchronous, the async cleanup runs on a spawned task.
struct DisconnectGuard<C: Codec> {
    connection: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let connection = self.connection;
        let state = Arc::clone(&self.state);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        runtime.spawn(async move {
            state.dispatcher.handle_close(connection).await;
            state.dispatcher.outboxes().unregister(connection).await;
            tracing::debug!(%connection, "connection cleaned up");
        });
    }
}

/// Handles a single peer from accept to close.
///
/// # Errors
/// Returns the transport error if the upgrade fails; the peer never
/// reaches the room state in that case.
pub(crate) async fn handle_connection<C: Codec>(
    pending: PendingUpgrade,
    state: Arc<ServerState<C>>,
) -> Result<(), RoomcastError> {
    let conn = Arc::new(pending.establish().await?);
    let connection = conn.id();
    tracing::debug!(%connection, peer = %conn.peer_addr(), "handling new connection");

    let outbox = state.dispatcher.outboxes().register(connection).await;
    tokio::spawn(write_loop(Arc::clone(&conn), outbox));

    let _guard = DisconnectGuard {
        connection,
        state: Arc::clone(&state),
    };

    loop {
        let received = match state.config.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::info!(%connection, "connection idle, closing");
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%connection, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%connection, error = %e, "recv error");
                break;
            }
        };

        let queued = state.dispatcher.handle_message(connection, &data).await;
        tracing::trace!(%connection, messages = queued.len(), "frame handled");
    }

    // _guard drops here → leave room, notify, close outbox.
    Ok(())
}

/// Drains one connection's outbox onto the wire.
///
/// Ends when the outbox is closed (connection cleaned up) or a send
/// fails; either way the connection is then closed.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut outbox: mpsc::Receiver<Payload>,
) {
    let connection = conn.id();
    while let Some(payload) = outbox.recv().await {
        if let Err(e) = conn.send(&payload).await {
            tracing::debug!(%connection, error = %e, "send failed, stopping writer");
            break;
        }
    }
    if let Err(e) = conn.close().await {
        tracing::trace!(%connection, error = %e, "close after writer exit");
    }
}
