//! Per-connection outboxes.
//!
//! Every live connection has a bounded queue drained by its own writer
//! task. Delivering to a connection is a non-blocking `try_send`: a full
//! queue or a closed connection is logged and skipped, and never holds up
//! delivery to the other targets.

use std::collections::HashMap;
use std::sync::Arc;

use roomcast_transport::ConnectionId;
use tokio::sync::{Mutex, mpsc};

/// Bytes queued for one connection. Shared across all targets of a
/// broadcast.
pub type Payload = Arc<[u8]>;

/// One encoded message and the connections that should receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub targets: Vec<ConnectionId>,
    pub payload: Payload,
}

impl Outbound {
    pub fn new(targets: Vec<ConnectionId>, payload: impl Into<Payload>) -> Self {
        Self {
            targets,
            payload: payload.into(),
        }
    }
}

/// Registry of outbox senders, keyed by connection.
pub(crate) struct Outboxes {
    senders: Mutex<HashMap<ConnectionId, mpsc::Sender<Payload>>>,
    capacity: usize,
}

impl Outboxes {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            senders: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Opens an outbox for a connection and returns its receiving end.
    pub(crate) async fn register(
        &self,
        connection: ConnectionId,
    ) -> mpsc::Receiver<Payload> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.senders.lock().await.insert(connection, tx);
        rx
    }

    /// Closes a connection's outbox. Its writer task finishes once the
    /// queue drains.
    pub(crate) async fn unregister(&self, connection: ConnectionId) {
        self.senders.lock().await.remove(&connection);
    }

    /// Queues each outbound message for each of its targets. Returns the
    /// number of successful enqueues.
    pub(crate) async fn deliver(&self, outbound: &[Outbound]) -> usize {
        if outbound.is_empty() {
            return 0;
        }

        let senders = self.senders.lock().await;
        let mut delivered = 0;
        for msg in outbound {
            for target in &msg.targets {
                let Some(tx) = senders.get(target) else {
                    tracing::debug!(%target, "delivery skipped, no outbox");
                    continue;
                };
                match tx.try_send(Arc::clone(&msg.payload)) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(%target, "delivery dropped, outbox full");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!(%target, "delivery dropped, outbox closed");
                    }
                }
            }
        }
        delivered
    }
}
