//! Unified error type for roomcast.

use roomcast_transport::TransportError;

/// Top-level error returned by the server.
///
/// Protocol and room errors never surface here: the dispatcher answers
/// them in place with an `ERROR` envelope or a log line.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// A transport-level error (bind, accept, upgrade).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
