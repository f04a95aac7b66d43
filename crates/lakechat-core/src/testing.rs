//! In-memory doubles for the port traits, shared by the session tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use lakechat_types::error::{BackendError, StoreError};
use lakechat_types::message::{Message, NewMessage};
use lakechat_types::query::QueryResult;
use lakechat_types::room::{ChatRoom, RoomMetadataUpdate, default_room_title};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::backend::QueryBackend;
use crate::identity::IdentityProvider;
use crate::store::MessageStore;

// --- Store ---

#[derive(Default)]
struct StoreData {
    rooms: Vec<ChatRoom>,
    messages: HashMap<Uuid, Vec<Message>>,
}

/// Vec-backed store that records every call by name.
#[derive(Default)]
pub struct MockStore {
    data: Mutex<StoreData>,
    calls: Mutex<Vec<&'static str>>,
    pub fail_list_rooms: AtomicBool,
    pub fail_list_messages: AtomicBool,
    pub fail_append: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn room(&self, room_id: &Uuid) -> Option<ChatRoom> {
        self.data
            .lock()
            .unwrap()
            .rooms
            .iter()
            .find(|r| r.id == *room_id)
            .cloned()
    }

    pub fn stored_messages(&self, room_id: &Uuid) -> Vec<Message> {
        self.data
            .lock()
            .unwrap()
            .messages
            .get(room_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Insert a room with history directly, bypassing the call log.
    pub fn seed_room(&self, title: &str, texts: &[&str]) -> Uuid {
        let id = Uuid::now_v7();
        let mut data = self.data.lock().unwrap();
        data.rooms.push(ChatRoom {
            id,
            title: title.to_string(),
            last_message: None,
            updated_at: Utc::now(),
        });
        let messages = texts
            .iter()
            .map(|t| {
                Message::optimistic_user(id, *t)
                    .to_new()
                    .into_message(Uuid::now_v7(), id)
            })
            .collect();
        data.messages.insert(id, messages);
        id
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("mock store offline".to_string())
}

impl MessageStore for MockStore {
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, StoreError> {
        self.record("list_rooms");
        if self.fail_list_rooms.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut rooms = self.data.lock().unwrap().rooms.clone();
        rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rooms)
    }

    async fn list_messages(&self, room_id: &Uuid) -> Result<Vec<Message>, StoreError> {
        self.record("list_messages");
        if self.fail_list_messages.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let data = self.data.lock().unwrap();
        if !data.rooms.iter().any(|r| r.id == *room_id) {
            return Err(StoreError::NotFound);
        }
        Ok(data.messages.get(room_id).cloned().unwrap_or_default())
    }

    async fn create_room(&self, title: Option<String>) -> Result<ChatRoom, StoreError> {
        self.record("create_room");
        let now = Utc::now();
        let room = ChatRoom {
            id: Uuid::now_v7(),
            title: title.unwrap_or_else(|| default_room_title(now)),
            last_message: None,
            updated_at: now,
        };
        let mut data = self.data.lock().unwrap();
        data.rooms.push(room.clone());
        data.messages.insert(room.id, Vec::new());
        Ok(room)
    }

    async fn append_message(
        &self,
        room_id: &Uuid,
        message: &NewMessage,
    ) -> Result<Message, StoreError> {
        self.record("append_message");
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut data = self.data.lock().unwrap();
        let messages = data.messages.get_mut(room_id).ok_or(StoreError::NotFound)?;
        let persisted = message.clone().into_message(Uuid::now_v7(), *room_id);
        messages.push(persisted.clone());
        Ok(persisted)
    }

    async fn update_room_metadata(
        &self,
        room_id: &Uuid,
        update: &RoomMetadataUpdate,
    ) -> Result<(), StoreError> {
        self.record("update_room_metadata");
        let mut data = self.data.lock().unwrap();
        let room = data
            .rooms
            .iter_mut()
            .find(|r| r.id == *room_id)
            .ok_or(StoreError::NotFound)?;
        update.apply_to(room);
        Ok(())
    }

    async fn delete_room(&self, room_id: &Uuid) -> Result<(), StoreError> {
        self.record("delete_room");
        let mut data = self.data.lock().unwrap();
        let before = data.rooms.len();
        data.rooms.retain(|r| r.id != *room_id);
        data.messages.remove(room_id);
        if data.rooms.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// --- Backend ---

/// Backend that replays scripted replies, optionally holding each one until
/// the test releases it.
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<QueryResult, BackendError>>>,
    init_result: Mutex<Result<(), BackendError>>,
    queries: Mutex<Vec<(String, String)>>,
    init_calls: Mutex<Vec<String>>,
    init_in_flight: AtomicUsize,
    max_init_in_flight: AtomicUsize,
    /// Notified each time `submit_query` is entered.
    pub started: Arc<Notify>,
    /// When set, each reply waits for one notification.
    pub gate: Option<Arc<Notify>>,
    /// Delay applied inside `initialize_data_source`.
    pub init_delay: Option<Duration>,
    /// Never answer `submit_query`.
    pub hang: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            init_result: Mutex::new(Ok(())),
            queries: Mutex::new(Vec::new()),
            init_calls: Mutex::new(Vec::new()),
            init_in_flight: AtomicUsize::new(0),
            max_init_in_flight: AtomicUsize::new(0),
            started: Arc::new(Notify::new()),
            gate: None,
            init_delay: None,
            hang: false,
        }
    }

    pub fn with_reply(self, reply: Result<QueryResult, BackendError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn fail_init(self, error: BackendError) -> Self {
        *self.init_result.lock().unwrap() = Err(error);
        self
    }

    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn init_calls(&self) -> Vec<String> {
        self.init_calls.lock().unwrap().clone()
    }

    /// Highest number of overlapping `initialize_data_source` calls seen.
    pub fn max_init_in_flight(&self) -> usize {
        self.max_init_in_flight.load(Ordering::SeqCst)
    }
}

impl QueryBackend for MockBackend {
    async fn initialize_data_source(&self, company_id: &str) -> Result<(), BackendError> {
        self.init_calls.lock().unwrap().push(company_id.to_string());
        let now = self.init_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_init_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        self.init_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.init_result.lock().unwrap().clone()
    }

    async fn submit_query(&self, company_id: &str, query: &str) -> Result<QueryResult, BackendError> {
        self.queries
            .lock()
            .unwrap()
            .push((company_id.to_string(), query.to_string()));
        self.started.notify_one();

        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let scripted = self.replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(QueryResult::Text {
                answer: "ok".to_string(),
            })
        })
    }
}

// --- Identity ---

pub struct FixedIdentity(pub Option<String>);

impl FixedIdentity {
    pub fn signed_in() -> Self {
        Self(Some("acme-co".to_string()))
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}
