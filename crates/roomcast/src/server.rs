//! `RoomcastServer` builder and server loop.
//!
//! This is the entry point for running a relay. It ties together all the
//! layers: transport → protocol → rooms → outboxes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use roomcast_protocol::{Codec, JsonCodec};
use roomcast_room::RoomConfig;
use roomcast_transport::{Transport, WebSocketTransport};

use crate::dispatch::Dispatcher;
use crate::handler::handle_connection;
use crate::{RoomcastError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) dispatcher: Dispatcher<C>,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a roomcast server.
///
/// # Example
///
/// ```rust,no_run
/// use roomcast::prelude::*;
///
/// # async fn run() -> Result<(), RoomcastError> {
/// let server = RoomcastServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RoomcastServerBuilder {
    config: ServerConfig,
}

impl RoomcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Starts from an existing configuration, e.g. one loaded with
    /// [`ServerConfig::from_env`].
    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Restricts WebSocket upgrades to `path`; `None` accepts any path.
    pub fn ws_path(mut self, path: Option<&str>) -> Self {
        self.config.ws_path = path.map(str::to_string);
        self
    }

    /// Disconnects clients that stay silent for `timeout`.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets how long a peer gets to complete the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets how many messages may queue for one client.
    pub fn outbox_capacity(mut self, capacity: usize) -> Self {
        self.config.outbox_capacity = capacity;
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, rooms: RoomConfig) -> Self {
        self.config.rooms = rooms;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    ///
    /// # Errors
    /// [`RoomcastError::Config`] if the room settings are unusable, or a
    /// transport error if the address cannot be bound.
    pub async fn build(self) -> Result<RoomcastServer<JsonCodec>, RoomcastError> {
        self.config.rooms.validate().map_err(RoomcastError::Config)?;

        let transport = WebSocketTransport::bind(&self.config.bind_addr)
            .await?
            .with_path(self.config.ws_path.clone())
            .with_handshake_timeout(self.config.handshake_timeout);

        let dispatcher = Dispatcher::new(self.config.rooms.clone(), JsonCodec)
            .with_outbox_capacity(self.config.outbox_capacity);
        let state = Arc::new(ServerState {
            dispatcher,
            config: self.config,
        });

        Ok(RoomcastServer { transport, state })
    }
}

impl Default for RoomcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running roomcast server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RoomcastServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl RoomcastServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> RoomcastServerBuilder {
        RoomcastServerBuilder::new()
    }
}

impl<C: Codec> RoomcastServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), RoomcastError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Accepts incoming peers and spawns a handler task for each; the
    /// WebSocket upgrade runs on that task, never on the accept loop.
    /// Connections already running are left to finish on their own.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), RoomcastError> {
        tracing::info!(
            addr = %self.transport.local_addr().map(|a| a.to_string()).unwrap_or_default(),
            path = self.state.config.ws_path.as_deref().unwrap_or("*"),
            "roomcast server running"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let peer = pending.peer_addr();
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            match handle_connection(pending, state).await {
                                Ok(()) => {}
                                Err(RoomcastError::Transport(e))
                                    if e.is_peer_error() =>
                                {
                                    tracing::debug!(
                                        %peer,
                                        error = %e,
                                        "rejected connection"
                                    );
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        %peer,
                                        error = %e,
                                        "connection ended with error"
                                    );
                                }
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
