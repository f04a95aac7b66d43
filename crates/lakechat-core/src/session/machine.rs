//! The chat session state machine.
//!
//! `ChatSession` is the only mutator of the active room, the timeline and
//! the cached room list. Commands take `&self` and never hold the state lock
//! across a store or backend call, so the display layer can keep issuing
//! commands (switching rooms, deleting, refreshing) while a reply is pending.
//!
//! Stale replies are handled by discard-on-arrival: every change of the
//! active room bumps an epoch, and an in-flight send only touches the
//! timeline if the epoch it started under is still current. Rooms with a
//! query outstanding stay locked against new sends until it settles, even
//! if the user leaves and comes back in the meantime.

use std::collections::HashSet;
use std::time::Duration;

use lakechat_types::error::{BackendError, StoreError};
use lakechat_types::event::SessionEvent;
use lakechat_types::message::Message;
use lakechat_types::query::QueryResult;
use lakechat_types::room::{ChatRoom, RoomMetadataUpdate};
use thiserror::Error;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::QueryBackend;
use crate::event::bus::EventBus;
use crate::identity::IdentityProvider;
use crate::render::{REPLY_FAILED_TEXT, reply_message};
use crate::store::MessageStore;

use super::state::{IgnoredReason, SendOutcome, SessionPhase};

/// Errors surfaced by session commands.
///
/// `send_message` never fails: its failures end up in the timeline.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct SessionState {
    phase: SessionPhase,
    /// Bumped whenever the active room changes.
    epoch: u64,
    /// Bumped on every selection request; only the latest load is applied.
    selection_seq: u64,
    /// Rooms with a query outstanding, active or not.
    in_flight: HashSet<Uuid>,
    timeline: Vec<Message>,
    rooms: Vec<ChatRoom>,
}

impl SessionState {
    /// Leave the current room. Returns the room whose reply was abandoned.
    fn leave_room(&mut self, next: SessionPhase) -> Option<Uuid> {
        let abandoned = match self.phase {
            SessionPhase::AwaitingReply { room_id } => Some(room_id),
            _ => None,
        };
        self.epoch += 1;
        self.phase = next;
        abandoned
    }

    /// Phase for entering `room_id`.
    fn entry_phase(&self, room_id: Uuid) -> SessionPhase {
        if self.in_flight.contains(&room_id) {
            SessionPhase::AwaitingReply { room_id }
        } else {
            SessionPhase::RoomSelected { room_id }
        }
    }
}

/// Chat session over a message store, a query backend and an identity source.
pub struct ChatSession<S, B, I> {
    store: S,
    backend: B,
    identity: I,
    state: Mutex<SessionState>,
    create_lock: Mutex<()>,
    events: EventBus,
    request_timeout: Duration,
}

impl<S: MessageStore, B: QueryBackend, I: IdentityProvider> ChatSession<S, B, I> {
    /// Create an idle session. `request_timeout` bounds every backend call.
    pub fn new(store: S, backend: B, identity: I, request_timeout: Duration) -> Self {
        Self {
            store,
            backend,
            identity,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Idle,
                epoch: 0,
                selection_seq: 0,
                in_flight: HashSet::new(),
                timeline: Vec::new(),
                rooms: Vec::new(),
            }),
            create_lock: Mutex::new(()),
            events: EventBus::default(),
            request_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // --- Read accessors ---

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn current_room_id(&self) -> Option<Uuid> {
        self.state.lock().await.phase.room_id()
    }

    pub async fn is_pending(&self) -> bool {
        self.state.lock().await.phase.is_pending()
    }

    /// Snapshot of the active room's timeline.
    pub async fn timeline(&self) -> Vec<Message> {
        self.state.lock().await.timeline.clone()
    }

    /// Snapshot of the cached room list, most recently updated first.
    pub async fn rooms(&self) -> Vec<ChatRoom> {
        self.state.lock().await.rooms.clone()
    }

    // --- Commands ---

    /// Reload the room list. On failure the cached list is kept.
    pub async fn refresh_rooms(&self) -> Result<Vec<ChatRoom>, SessionError> {
        let rooms = self
            .store
            .list_rooms()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to list rooms, keeping cached list"))?;

        self.state.lock().await.rooms = rooms.clone();
        self.events.publish(SessionEvent::RoomsRefreshed { count: rooms.len() });
        Ok(rooms)
    }

    /// Make `room_id` the active room and load its history.
    ///
    /// A reply still in flight for the previous room is abandoned. Selecting
    /// the room that is already active reloads its history unless a reply is
    /// pending there, and never abandons that reply. Entering a room whose
    /// query is still outstanding puts the session back in `AwaitingReply`.
    /// If the load fails the session stays where it was.
    pub async fn select_room(&self, room_id: Uuid) -> Result<(), SessionError> {
        let ticket = {
            let mut state = self.state.lock().await;
            state.selection_seq += 1;
            state.selection_seq
        };

        let messages = self
            .store
            .list_messages(&room_id)
            .await
            .inspect_err(|e| warn!(room_id = %room_id, error = %e, "Failed to load room history"))?;

        let (abandoned, pending, message_count) = {
            let mut state = self.state.lock().await;
            if state.selection_seq != ticket {
                debug!(room_id = %room_id, "Room load superseded by a newer selection");
                return Ok(());
            }
            if state.phase.room_id() == Some(room_id) {
                if state.phase.is_pending() {
                    debug!(room_id = %room_id, "Room already active with a reply pending");
                } else {
                    state.timeline = messages;
                }
                (None, false, state.timeline.len())
            } else {
                let next = state.entry_phase(room_id);
                let abandoned = state.leave_room(next);
                state.timeline = messages;
                (abandoned, next.is_pending(), state.timeline.len())
            }
        };

        if let Some(previous) = abandoned {
            debug!(room_id = %previous, "Abandoned in-flight reply");
            self.events.publish(SessionEvent::PendingChanged {
                room_id: previous,
                pending: false,
            });
        }
        debug!(room_id = %room_id, message_count, "Room selected");
        self.events.publish(SessionEvent::RoomSelected {
            room_id,
            message_count,
        });
        if pending {
            self.events.publish(SessionEvent::PendingChanged {
                room_id,
                pending: true,
            });
        }
        Ok(())
    }

    /// Create a room, make it active and initialize the user's data source.
    ///
    /// Calls are serialized: a second `create_room` waits until the first
    /// has finished, data source initialization included. Initialization
    /// failures are reported as a `Notice` and do not fail the call.
    pub async fn create_room(&self, title: Option<String>) -> Result<ChatRoom, SessionError> {
        let _creating = self.create_lock.lock().await;

        let room = self
            .store
            .create_room(title)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to create room"))?;
        info!(room_id = %room.id, title = %room.title, "Room created");

        self.select_room(room.id).await?;
        self.initialize_data_source().await;

        if self.refresh_rooms().await.is_err() {
            let mut state = self.state.lock().await;
            if !state.rooms.iter().any(|r| r.id == room.id) {
                state.rooms.insert(0, room.clone());
            }
        }

        Ok(room)
    }

    /// Send a user message in the active room and apply the backend's reply.
    ///
    /// Ignored (with no store or backend call) for blank input, when no room
    /// is selected, or while a reply for the active room is still pending.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored(IgnoredReason::EmptyInput);
        }

        let (room_id, epoch, index, user_message) = {
            let mut state = self.state.lock().await;
            let room_id = match state.phase {
                SessionPhase::Idle => return SendOutcome::Ignored(IgnoredReason::NoRoomSelected),
                SessionPhase::AwaitingReply { .. } => {
                    return SendOutcome::Ignored(IgnoredReason::ReplyPending);
                }
                SessionPhase::RoomSelected { room_id } => room_id,
            };
            if !state.in_flight.insert(room_id) {
                return SendOutcome::Ignored(IgnoredReason::ReplyPending);
            }
            let message = Message::optimistic_user(room_id, text);
            state.timeline.push(message.clone());
            state.phase = SessionPhase::AwaitingReply { room_id };
            (room_id, state.epoch, state.timeline.len() - 1, message)
        };

        self.events
            .publish(SessionEvent::MessageAppended { room_id, index });
        self.events.publish(SessionEvent::PendingChanged {
            room_id,
            pending: true,
        });

        let outcome = self.exchange(room_id, epoch, index, &user_message).await;
        self.finish_pending(room_id, epoch).await;
        outcome
    }

    /// Delete a room and its messages.
    ///
    /// A room that is already gone counts as deleted. Deleting the active
    /// room returns the session to `Idle`.
    pub async fn delete_room(&self, room_id: Uuid) -> Result<(), SessionError> {
        match self.store.delete_room(&room_id).await {
            Ok(()) => info!(room_id = %room_id, "Room deleted"),
            Err(StoreError::NotFound) => debug!(room_id = %room_id, "Room already absent"),
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to delete room");
                return Err(e.into());
            }
        }

        let (was_active, abandoned) = {
            let mut state = self.state.lock().await;
            state.rooms.retain(|r| r.id != room_id);
            if state.phase.room_id() == Some(room_id) {
                let abandoned = state.leave_room(SessionPhase::Idle);
                state.timeline.clear();
                (true, abandoned)
            } else {
                (false, None)
            }
        };

        if let Some(previous) = abandoned {
            self.events.publish(SessionEvent::PendingChanged {
                room_id: previous,
                pending: false,
            });
        }
        if was_active {
            self.events.publish(SessionEvent::TimelineCleared);
        }

        // Failure already logged; the pruned cache stands.
        let _ = self.refresh_rooms().await;
        Ok(())
    }

    // --- Exchange steps ---

    async fn exchange(
        &self,
        room_id: Uuid,
        epoch: u64,
        index: usize,
        user_message: &Message,
    ) -> SendOutcome {
        match self
            .store
            .append_message(&room_id, &user_message.to_new())
            .await
        {
            Ok(persisted) => self.reconcile(epoch, index, persisted).await,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to persist user message");
                return self.apply_failure(room_id, epoch).await;
            }
        }

        let result = match self.identity.current_user_id() {
            Some(company_id) => self.query(&company_id, &user_message.text).await,
            None => Err(BackendError::Unauthenticated),
        };
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Query failed");
                return self.apply_failure(room_id, epoch).await;
            }
        };

        let reply = reply_message(result);
        let (assistant, saved) = match self.store.append_message(&room_id, &reply).await {
            Ok(persisted) => (persisted, true),
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to persist reply, showing it unsaved");
                (reply.into_unsaved(room_id), false)
            }
        };
        let updated_at = assistant.timestamp;
        let outcome = self.apply_reply(room_id, epoch, assistant).await;

        if saved {
            let update = RoomMetadataUpdate::exchange(user_message.text.clone(), updated_at);
            match self.store.update_room_metadata(&room_id, &update).await {
                Ok(()) => self.apply_room_update(room_id, &update).await,
                Err(e) => {
                    warn!(room_id = %room_id, error = %e, "Failed to update room metadata");
                }
            }
        }

        outcome
    }

    async fn query(&self, company_id: &str, text: &str) -> Result<QueryResult, BackendError> {
        match tokio::time::timeout(
            self.request_timeout,
            self.backend.submit_query(company_id, text),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.request_timeout)),
        }
    }

    async fn initialize_data_source(&self) {
        let Some(company_id) = self.identity.current_user_id() else {
            debug!("No signed-in user, skipping data source initialization");
            self.events.publish(SessionEvent::Notice {
                message: "Not signed in: data source was not initialized".to_string(),
            });
            return;
        };

        let result = match tokio::time::timeout(
            self.request_timeout,
            self.backend.initialize_data_source(&company_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.request_timeout)),
        };

        match result {
            Ok(()) => debug!(company_id = %company_id, "Data source initialized"),
            Err(e) => {
                warn!(company_id = %company_id, error = %e, "Data source initialization failed");
                self.events.publish(SessionEvent::Notice {
                    message: format!("Data source setup failed: {e}"),
                });
            }
        }
    }

    /// Record the store id on the optimistic copy, if it is still shown.
    async fn reconcile(&self, epoch: u64, index: usize, persisted: Message) {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return;
        }
        if let Some(message) = state.timeline.get_mut(index) {
            if !message.is_persisted() && message.timestamp == persisted.timestamp {
                message.id = persisted.id;
            }
        }
    }

    async fn apply_reply(&self, room_id: Uuid, epoch: u64, reply: Message) -> SendOutcome {
        if self.push_if_current(room_id, epoch, reply).await {
            SendOutcome::Replied
        } else {
            SendOutcome::Discarded
        }
    }

    async fn apply_failure(&self, room_id: Uuid, epoch: u64) -> SendOutcome {
        let placeholder = Message::error_placeholder(room_id, REPLY_FAILED_TEXT);
        if self.push_if_current(room_id, epoch, placeholder).await {
            SendOutcome::Failed
        } else {
            SendOutcome::Discarded
        }
    }

    async fn push_if_current(&self, room_id: Uuid, epoch: u64, message: Message) -> bool {
        let index = {
            let mut state = self.state.lock().await;
            if state.epoch != epoch {
                debug!(room_id = %room_id, "Discarding reply for a room that is no longer active");
                return false;
            }
            state.timeline.push(message);
            state.timeline.len() - 1
        };
        self.events
            .publish(SessionEvent::MessageAppended { room_id, index });
        true
    }

    async fn apply_room_update(&self, room_id: Uuid, update: &RoomMetadataUpdate) {
        let mut state = self.state.lock().await;
        if let Some(room) = state.rooms.iter_mut().find(|r| r.id == room_id) {
            update.apply_to(room);
        }
        state
            .rooms
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    /// Release `room_id` for new sends.
    ///
    /// If the user left the room and came back while the query was out, the
    /// reply was discarded on arrival; reload the history so it shows up.
    async fn finish_pending(&self, room_id: Uuid, epoch: u64) {
        let returned = {
            let mut state = self.state.lock().await;
            state.in_flight.remove(&room_id);
            if state.phase != (SessionPhase::AwaitingReply { room_id }) {
                return;
            }
            state.phase = SessionPhase::RoomSelected { room_id };
            state.epoch != epoch
        };
        self.events.publish(SessionEvent::PendingChanged {
            room_id,
            pending: false,
        });
        if returned {
            self.reload_timeline(room_id).await;
        }
    }

    /// Replace the active room's timeline with its stored history.
    ///
    /// Skipped if the session moved on while the history was loading.
    async fn reload_timeline(&self, room_id: Uuid) {
        let (epoch, ticket) = {
            let state = self.state.lock().await;
            (state.epoch, state.selection_seq)
        };

        let messages = match self.store.list_messages(&room_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to reload room history");
                return;
            }
        };

        let message_count = messages.len();
        {
            let mut state = self.state.lock().await;
            if state.epoch != epoch
                || state.selection_seq != ticket
                || state.phase != (SessionPhase::RoomSelected { room_id })
            {
                return;
            }
            state.timeline = messages;
        }
        debug!(room_id = %room_id, message_count, "Room history reloaded");
        self.events.publish(SessionEvent::RoomSelected {
            room_id,
            message_count,
        });
    }
}
