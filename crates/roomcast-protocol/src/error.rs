//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes themselves were the problem:
//! either they could not be parsed, or they parsed but lack a field the
//! command needs. Nothing in the room state is touched when one is
//! returned.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing `command`, or a
    /// field with the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope parsed, but a field required by its command is
    /// missing or empty (e.g. `JOIN_ROOM` without `data.roomName`).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ProtocolError {
    /// `true` when the payload could not be parsed at all.
    pub fn is_decode(&self) -> bool {
        match self {
            #[cfg(feature = "json")]
            Self::Decode(_) => true,
            _ => false,
        }
    }
}
