//! MessageStore trait definition.
//!
//! Thin gateway to the external document store holding rooms and their
//! ordered messages. Follows the RPITIT pattern (native async fn in traits).

use lakechat_types::error::StoreError;
use lakechat_types::message::{Message, NewMessage};
use lakechat_types::room::{ChatRoom, RoomMetadataUpdate};
use uuid::Uuid;

/// Gateway to the persistent room/message store.
///
/// Implementations live in lakechat-infra (e.g., `SqliteMessageStore`).
/// No method retries; the caller owns the retry policy.
pub trait MessageStore: Send + Sync {
    /// List all rooms, most recently updated first.
    fn list_rooms(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ChatRoom>, StoreError>> + Send;

    /// List a room's messages by timestamp ascending, ties in insertion order.
    ///
    /// Fails with `NotFound` if the room does not exist.
    fn list_messages(
        &self,
        room_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Create a room. `None` titles default to the creation timestamp.
    fn create_room(
        &self,
        title: Option<String>,
    ) -> impl std::future::Future<Output = Result<ChatRoom, StoreError>> + Send;

    /// Append a message to a room and return it with its assigned id.
    ///
    /// Does not touch the room's `last_message` / `updated_at`; that is a
    /// separate `update_room_metadata` call.
    fn append_message(
        &self,
        room_id: &Uuid,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<Message, StoreError>> + Send;

    /// Merge the supplied metadata fields into a room.
    fn update_room_metadata(
        &self,
        room_id: &Uuid,
        update: &RoomMetadataUpdate,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a room together with all of its messages.
    fn delete_room(
        &self,
        room_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
