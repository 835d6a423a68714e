//! Conversation view, user directory, and unread inbox.
//!
//! SYSTEM CONTEXT
//! ==============
//! Holds the messages of the conversation currently on screen, the known and
//! online user lists, and the inbox of unread messages for every other
//! conversation. Callers pass the signed-in username explicitly; the store
//! never reads the session.
//!
//! ERROR POLICY
//! ============
//! Every operation keeps the last good state on failure. Critical operations
//! (thread loads, sends, mark-read) record a localized message in `error` and
//! return a [`StoreError`]. Directory and inbox refreshes are non-critical:
//! they only log and set the matching [`FetchStatus`].
//!
//! Thread loads are tagged with a monotonic sequence number so that a slow
//! load for a conversation the user already left cannot overwrite the view.

#[cfg(test)]
#[path = "conversation_test.rs"]
mod conversation_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::error::{ApiError, StoreError};
use crate::i18n::{Locale, Text};
use crate::net::api::ChatApi;
use crate::net::types::{Message, MessageType, RoomMessageRequest, SendMessageRequest, User};
use crate::state::inbox::{Conversation, Inbox};

/// Outcome of the last non-critical fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FetchStatus {
    /// Never fetched.
    #[default]
    Idle,
    Loaded,
    /// Last fetch failed; the previous data is still in place.
    Failed(String),
}

impl FetchStatus {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Where a pushed message ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Appended to the visible thread.
    Displayed,
    /// Filed in the inbox.
    Unread,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Username the store last acted for; used to file pushed messages.
    pub me: Option<String>,
    pub active: Option<Conversation>,
    pub messages: Vec<Message>,
    pub users: Vec<User>,
    pub online_users: Vec<User>,
    pub users_status: FetchStatus,
    pub online_users_status: FetchStatus,
    pub unread_status: FetchStatus,
    pub loading: bool,
    /// Localized message from the last failed critical operation.
    pub error: Option<String>,
    pub inbox: Inbox,
}

impl ConversationState {
    /// Peer of the active private conversation.
    #[must_use]
    pub fn active_peer(&self) -> Option<&str> {
        match &self.active {
            Some(Conversation::Direct(peer)) => Some(peer),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: ConversationState,
    load_seq: u64,
}

pub struct ConversationStore {
    api: Arc<dyn ChatApi>,
    locale: Locale,
    history_limit: u32,
    inner: Mutex<Inner>,
}

impl ConversationStore {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, locale: Locale) -> Self {
        Self::with_history_limit(api, locale, DEFAULT_HISTORY_LIMIT)
    }

    #[must_use]
    pub fn with_history_limit(api: Arc<dyn ChatApi>, locale: Locale, history_limit: u32) -> Self {
        Self { api, locale, history_limit, inner: Mutex::new(Inner::default()) }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- reads ---

    #[must_use]
    pub fn snapshot(&self) -> ConversationState {
        self.inner().state.clone()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner().state.messages.clone()
    }

    #[must_use]
    pub fn active(&self) -> Option<Conversation> {
        self.inner().state.active.clone()
    }

    #[must_use]
    pub fn active_peer(&self) -> Option<String> {
        self.inner().state.active_peer().map(ToOwned::to_owned)
    }

    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.inner().state.users.clone()
    }

    #[must_use]
    pub fn online_users(&self) -> Vec<User> {
        self.inner().state.online_users.clone()
    }

    #[must_use]
    pub fn unread_count(&self, conversation: &Conversation) -> usize {
        self.inner().state.inbox.unread_count(conversation)
    }

    #[must_use]
    pub fn total_unread(&self) -> usize {
        self.inner().state.inbox.total_unread()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner().state.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner().state.error.clone()
    }

    // --- threads ---

    /// Load the private history between `me` and `peer` and make it the
    /// visible thread.
    ///
    /// Returns the server snapshot. A completion overtaken by a newer load
    /// is returned but not applied.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the localized load fallback. The visible
    /// thread and active conversation are left as they were.
    pub async fn load_messages(&self, me: &str, peer: &str) -> Result<Vec<Message>, StoreError> {
        self.load_messages_with_limit(me, peer, self.history_limit).await
    }

    /// [`Self::load_messages`] with a one-off page size.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::load_messages`].
    pub async fn load_messages_with_limit(&self, me: &str, peer: &str, limit: u32) -> Result<Vec<Message>, StoreError> {
        let ticket = self.begin_load(me);
        let result = self.api.private_history(me, peer, limit).await;
        self.finish_load(ticket, Conversation::Direct(peer.to_owned()), result)
    }

    /// Room counterpart of [`Self::load_messages`].
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::load_messages`].
    pub async fn load_room_messages(&self, me: &str, room_id: &str) -> Result<Vec<Message>, StoreError> {
        self.load_room_messages_with_limit(me, room_id, self.history_limit).await
    }

    /// # Errors
    ///
    /// Same policy as [`Self::load_messages`].
    pub async fn load_room_messages_with_limit(
        &self,
        me: &str,
        room_id: &str,
        limit: u32,
    ) -> Result<Vec<Message>, StoreError> {
        let ticket = self.begin_load(me);
        let result = self.api.room_history(room_id, limit).await;
        self.finish_load(ticket, Conversation::Room(room_id.to_owned()), result)
    }

    fn begin_load(&self, me: &str) -> u64 {
        let mut inner = self.inner();
        inner.load_seq += 1;
        inner.state.me = Some(me.to_owned());
        inner.state.loading = true;
        inner.state.error = None;
        inner.load_seq
    }

    fn finish_load(
        &self,
        ticket: u64,
        conversation: Conversation,
        result: Result<Vec<Message>, ApiError>,
    ) -> Result<Vec<Message>, StoreError> {
        let mut inner = self.inner();
        let current = inner.load_seq == ticket;
        if current {
            inner.state.loading = false;
        }

        match result {
            Ok(messages) => {
                if !current {
                    tracing::debug!(%conversation, ticket, "discarding stale history load");
                    return Ok(messages);
                }
                tracing::debug!(%conversation, count = messages.len(), "history loaded");
                inner.state.inbox.take(&conversation);
                inner.state.active = Some(conversation);
                inner.state.messages.clone_from(&messages);
                Ok(messages)
            }
            Err(e) => {
                // Server detail is not shown for loads; the view gets the generic text.
                let err = StoreError::new(self.locale.text(Text::LoadMessagesFailed), e);
                tracing::warn!(%conversation, error = %err.api_error(), "history load failed");
                if current {
                    inner.state.error = Some(err.message().to_owned());
                }
                Err(err)
            }
        }
    }

    /// Send a private text message and append the server's copy.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized send
    /// fallback. Nothing is appended.
    pub async fn send_message(&self, me: &str, content: &str, recipient: &str) -> Result<Message, StoreError> {
        self.begin_send(me);
        let req = SendMessageRequest {
            content: content.to_owned(),
            recipient: recipient.to_owned(),
            message_type: MessageType::Text,
        };
        let result = self.api.send_message(me, &req).await;
        self.finish_send(result)
    }

    /// Send a text message to a room and append the server's copy.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::send_message`].
    pub async fn send_room_message(&self, me: &str, room_id: &str, content: &str) -> Result<Message, StoreError> {
        self.begin_send(me);
        let req = RoomMessageRequest {
            room_id: room_id.to_owned(),
            sender: me.to_owned(),
            content: content.to_owned(),
            message_type: MessageType::Text,
        };
        let result = self.api.send_room_message(room_id, &req).await;
        self.finish_send(result)
    }

    fn begin_send(&self, me: &str) {
        let mut inner = self.inner();
        inner.state.me = Some(me.to_owned());
        inner.state.error = None;
    }

    fn finish_send(&self, result: Result<Message, ApiError>) -> Result<Message, StoreError> {
        let mut inner = self.inner();
        match result {
            Ok(message) => {
                inner.state.messages.push(message.clone());
                Ok(message)
            }
            Err(e) => {
                let err = StoreError::with_fallback(e, self.locale.text(Text::SendMessageFailed));
                tracing::warn!(error = %err.api_error(), "send failed");
                inner.state.error = Some(err.message().to_owned());
                Err(err)
            }
        }
    }

    // --- push hook ---

    /// Deliver a message pushed from outside (a real-time channel).
    ///
    /// Messages of the active conversation are appended to the visible
    /// thread; everything else goes to the inbox.
    pub fn add_message(&self, message: Message) -> Delivery {
        let mut inner = self.inner();
        let state = &mut inner.state;
        if state.active.as_ref().is_some_and(|active| active.contains(&message)) {
            state.messages.push(message);
            return Delivery::Displayed;
        }
        let conversation = Conversation::of(&message, state.me.as_deref());
        tracing::debug!(%conversation, "message filed as unread");
        state.inbox.record(conversation, message);
        Delivery::Unread
    }

    // --- directory ---

    /// Refresh the full user list. Failures keep the previous list.
    pub async fn load_users(&self) -> FetchStatus {
        let result = self.api.list_users().await;
        let mut inner = self.inner();
        let state = &mut inner.state;
        state.users_status = match result {
            Ok(users) => {
                state.users = users;
                FetchStatus::Loaded
            }
            Err(e) => {
                tracing::warn!(error = %e, "user list refresh failed");
                FetchStatus::Failed(e.to_string())
            }
        };
        state.users_status.clone()
    }

    /// Refresh the online user list. Failures keep the previous list.
    pub async fn load_online_users(&self) -> FetchStatus {
        let result = self.api.list_online_users().await;
        let mut inner = self.inner();
        let state = &mut inner.state;
        state.online_users_status = match result {
            Ok(users) => {
                state.online_users = users;
                FetchStatus::Loaded
            }
            Err(e) => {
                tracing::warn!(error = %e, "online user refresh failed");
                FetchStatus::Failed(e.to_string())
            }
        };
        state.online_users_status.clone()
    }

    // --- unread ---

    /// Rebuild the inbox from the server's unread list for `me`.
    pub async fn load_unread(&self, me: &str) -> FetchStatus {
        self.inner().state.me = Some(me.to_owned());
        let result = self.api.unread_messages(me).await;
        let mut inner = self.inner();
        let state = &mut inner.state;
        state.unread_status = match result {
            Ok(messages) => {
                state.inbox.replace_all(messages, Some(me));
                FetchStatus::Loaded
            }
            Err(e) => {
                tracing::warn!(username = me, error = %e, "unread refresh failed");
                FetchStatus::Failed(e.to_string())
            }
        };
        state.unread_status.clone()
    }

    /// Mark one message read on the server, then locally.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback; local state is unchanged.
    pub async fn mark_read(&self, message_id: &str) -> Result<(), StoreError> {
        let result = self.api.mark_read(message_id).await;
        let mut inner = self.inner();
        let state = &mut inner.state;
        match result {
            Ok(_) => {
                for message in state.messages.iter_mut().filter(|m| m.id.as_deref() == Some(message_id)) {
                    message.is_read = true;
                }
                state.inbox.remove_message(message_id);
                Ok(())
            }
            Err(e) => {
                let err = StoreError::with_fallback(e, self.locale.text(Text::MarkReadFailed));
                tracing::warn!(message_id, error = %err.api_error(), "mark read failed");
                state.error = Some(err.message().to_owned());
                Err(err)
            }
        }
    }

    /// Forget everything, e.g. after logout. In-flight loads become stale.
    pub fn clear(&self) {
        let mut inner = self.inner();
        inner.load_seq += 1;
        inner.state = ConversationState::default();
    }
}
