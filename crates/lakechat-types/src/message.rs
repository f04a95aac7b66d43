//! Chat message types.
//!
//! `Message` is the timeline entry the session holds and the store returns.
//! `NewMessage` is what gets handed to the store for persistence: it has no
//! id and no error flag, so a local failure placeholder can never be written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::chart::ChartSpec;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// A single entry in a room's timeline.
///
/// Messages within a room are ordered by `timestamp`, ties broken by store
/// insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned id. `None` for optimistic and local-only copies.
    pub id: Option<Uuid>,
    pub room_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Present only on assistant replies classified as visualizable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_spec: Option<ChartSpec>,
    /// True only for locally synthesized failure placeholders.
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    /// Optimistic copy of a user message, shown before the store confirms it.
    pub fn optimistic_user(room_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: None,
            room_id,
            sender: Sender::User,
            text: text.into(),
            timestamp: Utc::now(),
            chart_spec: None,
            is_error: false,
        }
    }

    /// Local-only failure placeholder. Never persisted.
    pub fn error_placeholder(room_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: None,
            room_id,
            sender: Sender::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            chart_spec: None,
            is_error: true,
        }
    }

    /// Whether the store has confirmed this message.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Persistable form of this message.
    pub fn to_new(&self) -> NewMessage {
        NewMessage {
            sender: self.sender,
            text: self.text.clone(),
            timestamp: self.timestamp,
            chart_spec: self.chart_spec.clone(),
        }
    }
}

/// A message as submitted to the store for appending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_spec: Option<ChartSpec>,
}

impl NewMessage {
    /// Build the persisted `Message` once the store has assigned an id.
    pub fn into_message(self, id: Uuid, room_id: Uuid) -> Message {
        Message {
            id: Some(id),
            room_id,
            sender: self.sender,
            text: self.text,
            timestamp: self.timestamp,
            chart_spec: self.chart_spec,
            is_error: false,
        }
    }

    /// Local copy of a message the store failed to accept.
    pub fn into_unsaved(self, room_id: Uuid) -> Message {
        Message {
            id: None,
            room_id,
            sender: self.sender,
            text: self.text,
            timestamp: self.timestamp,
            chart_spec: self.chart_spec,
            is_error: false,
        }
    }
}
