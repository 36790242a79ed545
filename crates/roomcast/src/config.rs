//! Server configuration.

use std::time::Duration;

use roomcast_room::{RandomRoomPolicy, RoomConfig};

use crate::RoomcastError;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default WebSocket upgrade path.
pub const DEFAULT_WS_PATH: &str = "/ws";

/// Default time a peer gets to complete the WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-connection outbox capacity, in messages.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// Configuration for a [`RoomcastServer`](crate::RoomcastServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,

    /// Only accept WebSocket upgrades on this path. `None` accepts any.
    pub ws_path: Option<String>,

    /// Drop a peer that has not finished the WebSocket upgrade after
    /// this long.
    pub handshake_timeout: Duration,

    /// Disconnect a client that sends nothing for this long.
    /// `None` disables the timeout.
    pub idle_timeout: Option<Duration>,

    /// Messages queued per connection before further deliveries to it are
    /// dropped.
    pub outbox_capacity: usize,

    /// Room naming and selection settings.
    pub rooms: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            ws_path: Some(DEFAULT_WS_PATH.to_string()),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            idle_timeout: None,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            rooms: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// Environment variables:
    /// - `ROOMCAST_BIND` - listen address (default: `127.0.0.1:8080`)
    /// - `ROOMCAST_WS_PATH` - upgrade path, `*` for any (default: `/ws`)
    /// - `ROOMCAST_HANDSHAKE_TIMEOUT_SECS` - upgrade deadline, at least 1
    ///   (default: 10)
    /// - `ROOMCAST_IDLE_TIMEOUT_SECS` - idle disconnect, `0` disables
    ///   (default: disabled)
    /// - `ROOMCAST_OUTBOX_CAPACITY` - queued messages per client (default: 256)
    /// - `ROOMCAST_DEFAULT_ROOM` - room for `JOIN_RANDOM_ROOM` when none
    ///   exist (default: `shua`)
    /// - `ROOMCAST_RANDOM_POLICY` - `uniform` or `first_by_name`
    ///   (default: `uniform`)
    ///
    /// # Errors
    /// Returns [`RoomcastError::Config`] when a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, RoomcastError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading values through
    /// `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, RoomcastError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("ROOMCAST_BIND") {
            config.bind_addr = bind;
        }

        if let Some(path) = lookup("ROOMCAST_WS_PATH") {
            config.ws_path = if path == "*" {
                None
            } else if path.starts_with('/') {
                Some(path)
            } else {
                return Err(RoomcastError::Config(format!(
                    "ROOMCAST_WS_PATH must start with '/', got {path:?}"
                )));
            };
        }

        if let Some(secs) = lookup("ROOMCAST_HANDSHAKE_TIMEOUT_SECS") {
            let secs: u64 = parse(&secs, "ROOMCAST_HANDSHAKE_TIMEOUT_SECS")?;
            if secs == 0 {
                return Err(RoomcastError::Config(
                    "ROOMCAST_HANDSHAKE_TIMEOUT_SECS must be at least 1".into(),
                ));
            }
            config.handshake_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = lookup("ROOMCAST_IDLE_TIMEOUT_SECS") {
            let secs: u64 = parse(&secs, "ROOMCAST_IDLE_TIMEOUT_SECS")?;
            config.idle_timeout =
                (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(capacity) = lookup("ROOMCAST_OUTBOX_CAPACITY") {
            config.outbox_capacity =
                parse(&capacity, "ROOMCAST_OUTBOX_CAPACITY")?;
            if config.outbox_capacity == 0 {
                return Err(RoomcastError::Config(
                    "ROOMCAST_OUTBOX_CAPACITY must be at least 1".into(),
                ));
            }
        }

        if let Some(room) = lookup("ROOMCAST_DEFAULT_ROOM") {
            config.rooms.default_room_name = room;
        }

        if let Some(policy) = lookup("ROOMCAST_RANDOM_POLICY") {
            config.rooms.random_policy = match policy.as_str() {
                "uniform" => RandomRoomPolicy::Uniform,
                "first_by_name" => RandomRoomPolicy::FirstByName,
                other => {
                    return Err(RoomcastError::Config(format!(
                        "unknown ROOMCAST_RANDOM_POLICY {other:?}"
                    )));
                }
            };
        }

        config.rooms.validate().map_err(RoomcastError::Config)?;
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(
    value: &str,
    key: &str,
) -> Result<T, RoomcastError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RoomcastError::Config(format!("{key}={value:?}: {e}")))
}
