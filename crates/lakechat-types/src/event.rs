//! Notifications published by the chat session to its display layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A state change of the chat session.
///
/// Events carry ids and indices only; subscribers read the current state
/// back from the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The cached room list was reloaded from the store.
    RoomsRefreshed { count: usize },

    /// A room became the active room and its history was loaded.
    RoomSelected { room_id: Uuid, message_count: usize },

    /// The timeline was emptied (active room deleted).
    TimelineCleared,

    /// A message was appended to the active room's timeline at `index`.
    MessageAppended { room_id: Uuid, index: usize },

    /// The pending-reply indicator changed.
    PendingChanged { room_id: Uuid, pending: bool },

    /// A non-fatal problem worth showing to the user.
    Notice { message: String },
}
