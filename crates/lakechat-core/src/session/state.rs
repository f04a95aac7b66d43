//! Session phases and command outcomes.

use uuid::Uuid;

/// Where the session is in its room lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No room selected.
    Idle,
    /// A room is loaded and no query is outstanding.
    RoomSelected { room_id: Uuid },
    /// A query for the active room is in flight.
    AwaitingReply { room_id: Uuid },
}

impl SessionPhase {
    /// The active room, if any.
    pub fn room_id(&self) -> Option<Uuid> {
        match self {
            SessionPhase::Idle => None,
            SessionPhase::RoomSelected { room_id } | SessionPhase::AwaitingReply { room_id } => {
                Some(*room_id)
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SessionPhase::AwaitingReply { .. })
    }
}

/// Why `send_message` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    EmptyInput,
    NoRoomSelected,
    ReplyPending,
}

/// Result of a `send_message` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Rejected before any store or backend call.
    Ignored(IgnoredReason),
    /// The assistant reply was appended to the timeline.
    Replied,
    /// An error bubble was appended to the timeline.
    Failed,
    /// The active room changed while the reply was in flight; the timeline
    /// was left alone.
    Discarded,
}
