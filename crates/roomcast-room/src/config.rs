//! Room configuration.

use serde::{Deserialize, Serialize};

/// Number of characters kept from a requested room name.
pub const DEFAULT_NAME_PREFIX_LEN: usize = 4;

/// Room created by `JOIN_RANDOM_ROOM` when no room exists yet.
pub const DEFAULT_ROOM_NAME: &str = "shua";

// ---------------------------------------------------------------------------
// RandomRoomPolicy
// ---------------------------------------------------------------------------

/// How `JOIN_RANDOM_ROOM` picks among existing rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomRoomPolicy {
    /// Uniformly random pick among all rooms.
    #[default]
    Uniform,

    /// The room whose name sorts first. Deterministic; useful in tests
    /// and for filling the oldest-named lobby first.
    FirstByName,
}

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room the manager creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Room names are the first `name_prefix_len` characters of the
    /// requested name. Shorter requests are rejected.
    pub name_prefix_len: usize,

    /// Name used when `JOIN_RANDOM_ROOM` finds no room to join.
    pub default_room_name: String,

    /// Selection policy for `JOIN_RANDOM_ROOM`.
    pub random_policy: RandomRoomPolicy,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name_prefix_len: DEFAULT_NAME_PREFIX_LEN,
            default_room_name: DEFAULT_ROOM_NAME.to_string(),
            random_policy: RandomRoomPolicy::default(),
        }
    }
}

impl RoomConfig {
    /// Checks that rooms can be named under this configuration.
    ///
    /// # Errors
    /// A description of the problem if the prefix length is zero, or the
    /// default room name is shorter than the prefix.
    pub fn validate(&self) -> Result<(), String> {
        if self.name_prefix_len == 0 {
            return Err("name_prefix_len must be at least 1".into());
        }
        if self.default_room_name.chars().count() < self.name_prefix_len {
            return Err(format!(
                "default room name {:?} is shorter than the {}-character prefix",
                self.default_room_name, self.name_prefix_len
            ));
        }
        Ok(())
    }
}
