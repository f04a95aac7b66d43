//! Chat room types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format used for titles of rooms created without an explicit title.
const DEFAULT_TITLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A named conversation thread with its own ordered message history.
///
/// Rooms are owned by the message store; the session only mirrors them.
/// `updated_at` never moves backwards for a given room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: Uuid,
    pub title: String,
    /// Preview of the most recent exchange, `None` until the first one completes.
    pub last_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Title given to a room created without one.
pub fn default_room_title(created_at: DateTime<Utc>) -> String {
    created_at.format(DEFAULT_TITLE_FORMAT).to_string()
}

/// Partial update of a room's metadata. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomMetadataUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RoomMetadataUpdate {
    /// Update both the preview text and the timestamp.
    pub fn exchange(last_message: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            last_message: Some(last_message.into()),
            updated_at: Some(updated_at),
        }
    }

    /// Apply the update to a cached room, keeping `updated_at` monotonic.
    pub fn apply_to(&self, room: &mut ChatRoom) {
        if let Some(text) = &self.last_message {
            room.last_message = Some(text.clone());
        }
        if let Some(at) = self.updated_at {
            if at > room.updated_at {
                room.updated_at = at;
            }
        }
    }
}
