//! Frame encoding.
//!
//! The coordinator never looks at raw bytes. A [`Codec`] turns an inbound
//! frame into a typed view and a [`ServerMessage`](crate::ServerMessage)
//! into an outbound frame. Clients of the relay speak JSON, so
//! [`JsonCodec`] is the only implementation today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between frames and typed values.
///
/// One instance is shared by every connection task.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// `ProtocolError::Encode` when the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Decodes `data` as a `T`.
    ///
    /// Fields `T` does not name are skipped, which lets one frame be
    /// decoded several times into progressively wider views.
    ///
    /// # Errors
    /// `ProtocolError::Decode` when `data` is not a valid `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON frames via `serde_json` (feature `json`, on by default).
///
/// ```rust
/// use roomcast_protocol::{Codec, JsonCodec, ServerMessage};
///
/// let bytes = JsonCodec
///     .encode(&ServerMessage::NewMaster { master: "bob".into() })
///     .unwrap();
/// assert_eq!(bytes, br#"{"command":"NEW_MASTER","master":"bob"}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::ServerMessage;

    #[test]
    fn test_room_joined_uses_wire_field_names() {
        let bytes = JsonCodec
            .encode(&ServerMessage::RoomJoined {
                room_name: "shua".into(),
                master: "alice".into(),
                player_count: 1,
            })
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["command"], "ROOM_JOINED");
        assert_eq!(json["roomName"], "shua");
        assert_eq!(json["master"], "alice");
        assert_eq!(json["playerCount"], 1);
    }

    #[test]
    fn test_error_envelope_shape() {
        let bytes = JsonCodec
            .encode(&ServerMessage::Error {
                code: 409,
                message: "taken".into(),
            })
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "command": "ERROR", "code": 409, "message": "taken" })
        );
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let result: Result<serde_json::Value, _> = JsonCodec.decode(b"not json {");
        assert!(result.unwrap_err().is_decode());
    }
}
