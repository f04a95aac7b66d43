//! SQLite message store implementation.
//!
//! Implements `MessageStore` from `lakechat-core` using sqlx with split
//! read/write pools. Raw queries, private Row structs for SQLite-to-domain
//! mapping.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds,
//! `Z` suffix) so that text ordering in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use lakechat_core::store::MessageStore;
use lakechat_types::chart::ChartSpec;
use lakechat_types::error::StoreError;
use lakechat_types::message::{Message, NewMessage, Sender};
use lakechat_types::room::{ChatRoom, RoomMetadataUpdate, default_room_title};
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageStore`.
pub struct SqliteMessageStore {
    pool: DatabasePool,
}

impl SqliteMessageStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn room_exists(&self, room_id: &Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM chatrooms WHERE id = ?")
            .bind(room_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(unavailable)?;
        Ok(row.is_some())
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct ChatRoomRow {
    id: String,
    title: String,
    last_message: Option<String>,
    updated_at: String,
}

impl ChatRoomRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            last_message: row.try_get("last_message")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_room(self) -> Result<ChatRoom, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Unavailable(format!("invalid room id: {e}")))?;

        Ok(ChatRoom {
            id,
            title: self.title,
            last_message: self.last_message,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    room_id: String,
    sender: String,
    text: String,
    timestamp: String,
    chart_spec: Option<String>,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            room_id: row.try_get("room_id")?,
            sender: row.try_get("sender")?,
            text: row.try_get("text")?,
            timestamp: row.try_get("timestamp")?,
            chart_spec: row.try_get("chart_spec")?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Unavailable(format!("invalid message id: {e}")))?;
        let room_id = Uuid::parse_str(&self.room_id)
            .map_err(|e| StoreError::Unavailable(format!("invalid room_id: {e}")))?;
        let sender: Sender = self.sender.parse().map_err(StoreError::Unavailable)?;
        let chart_spec = self
            .chart_spec
            .as_deref()
            .map(serde_json::from_str::<ChartSpec>)
            .transpose()
            .map_err(|e| StoreError::Unavailable(format!("invalid chart_spec: {e}")))?;

        Ok(Message {
            id: Some(id),
            room_id,
            sender,
            text: self.text,
            timestamp: parse_datetime(&self.timestamp)?,
            chart_spec,
            is_error: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Unavailable(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// MessageStore implementation
// ---------------------------------------------------------------------------

impl MessageStore for SqliteMessageStore {
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, StoreError> {
        let rows = sqlx::query("SELECT * FROM chatrooms ORDER BY updated_at DESC, rowid DESC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(unavailable)?;

        let mut rooms = Vec::with_capacity(rows.len());
        for row in &rows {
            let room_row = ChatRoomRow::from_row(row).map_err(unavailable)?;
            rooms.push(room_row.into_room()?);
        }

        Ok(rooms)
    }

    async fn list_messages(&self, room_id: &Uuid) -> Result<Vec<Message>, StoreError> {
        if !self.room_exists(room_id).await? {
            return Err(StoreError::NotFound);
        }

        let rows =
            sqlx::query("SELECT * FROM messages WHERE room_id = ? ORDER BY timestamp ASC, seq ASC")
                .bind(room_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(unavailable)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row = MessageRow::from_row(row).map_err(unavailable)?;
            messages.push(message_row.into_message()?);
        }

        Ok(messages)
    }

    async fn create_room(&self, title: Option<String>) -> Result<ChatRoom, StoreError> {
        let now = Utc::now();
        let room = ChatRoom {
            id: Uuid::now_v7(),
            title: title.unwrap_or_else(|| default_room_title(now)),
            last_message: None,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO chatrooms (id, title, last_message, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(room.id.to_string())
        .bind(&room.title)
        .bind(&room.last_message)
        .bind(format_datetime(&room.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(unavailable)?;

        debug!(room_id = %room.id, "Inserted chat room");
        Ok(room)
    }

    async fn append_message(
        &self,
        room_id: &Uuid,
        message: &NewMessage,
    ) -> Result<Message, StoreError> {
        let id = Uuid::now_v7();
        let chart_spec = message
            .chart_spec
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Unavailable(format!("failed to encode chart_spec: {e}")))?;

        sqlx::query(
            r#"INSERT INTO messages (id, room_id, sender, text, timestamp, chart_spec)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(room_id.to_string())
        .bind(message.sender.to_string())
        .bind(&message.text)
        .bind(format_datetime(&message.timestamp))
        .bind(chart_spec)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound,
            _ => unavailable(e),
        })?;

        Ok(message.clone().into_message(id, *room_id))
    }

    async fn update_room_metadata(
        &self,
        room_id: &Uuid,
        update: &RoomMetadataUpdate,
    ) -> Result<(), StoreError> {
        // MAX keeps updated_at monotonic; fixed-width timestamps compare as text.
        let result = sqlx::query(
            r#"UPDATE chatrooms
               SET last_message = COALESCE(?, last_message),
                   updated_at = MAX(updated_at, COALESCE(?, updated_at))
               WHERE id = ?"#,
        )
        .bind(&update.last_message)
        .bind(update.updated_at.as_ref().map(format_datetime))
        .bind(room_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete_room(&self, room_id: &Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.writer.begin().await.map_err(unavailable)?;

        sqlx::query("DELETE FROM messages WHERE room_id = ?")
            .bind(room_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        let result = sqlx::query("DELETE FROM chatrooms WHERE id = ?")
            .bind(room_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(unavailable)?;
            return Err(StoreError::NotFound);
        }

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }
}
