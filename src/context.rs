//! Application context bundling the transport, storage, and stores.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `AppContext` per running client. Callers hold it (or clone the `Arc`s
//! they need) instead of reaching for process-wide singletons, so tests can
//! build as many isolated contexts as they like.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::i18n::Locale;
use crate::net::api::ChatApi;
use crate::net::http::HttpChatApi;
use crate::router::{CHAT_PATH, NavigationGuard, Route};
use crate::state::{ConversationStore, RoomStore, SessionStore};
use crate::storage::{BlobStore, FileBlobStore};

pub struct AppContext {
    api: Arc<dyn ChatApi>,
    storage: Arc<dyn BlobStore>,
    session: Arc<SessionStore>,
    conversations: Arc<ConversationStore>,
    rooms: Arc<RoomStore>,
    guard: NavigationGuard,
}

impl AppContext {
    /// Wire stores over arbitrary transport and storage implementations.
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, storage: Arc<dyn BlobStore>, locale: Locale, history_limit: u32) -> Self {
        let session = Arc::new(SessionStore::new(api.clone(), storage.clone(), locale));
        let conversations = Arc::new(ConversationStore::with_history_limit(api.clone(), locale, history_limit));
        let rooms = Arc::new(RoomStore::new(api.clone(), locale));
        let guard = NavigationGuard::new(session.clone());
        Self { api, storage, session, conversations, rooms, guard }
    }

    /// HTTP transport plus the JSON-file blob store named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let api: Arc<dyn ChatApi> = Arc::new(HttpChatApi::from_config(config)?);
        let storage: Arc<dyn BlobStore> = Arc::new(FileBlobStore::new(&config.state_path));
        tracing::debug!(base_url = %config.base_url, state_path = %config.state_path.display(), "context configured");
        Ok(Self::new(api, storage, config.locale, config.history_limit))
    }

    /// Restore any persisted session. Returns whether one was found.
    pub fn bootstrap(&self) -> bool {
        let restored = self.session.load_from_storage();
        if restored {
            tracing::info!(username = ?self.session.username(), "session restored");
        }
        restored
    }

    /// Navigate to the protected chat view and return the signed-in
    /// username, or `None` when the guard redirected away.
    pub fn authenticated_user(&self) -> Option<String> {
        match self.guard.navigate(CHAT_PATH) {
            Ok(Route::Chat) => self.session.username(),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "navigation failed");
                None
            }
        }
    }

    /// Sign out and drop all per-user state.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.conversations.clear();
        self.rooms.clear();
    }

    #[must_use]
    pub fn api(&self) -> &Arc<dyn ChatApi> {
        &self.api
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn BlobStore> {
        &self.storage
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn conversations(&self) -> &Arc<ConversationStore> {
        &self.conversations
    }

    #[must_use]
    pub fn rooms(&self) -> &Arc<RoomStore> {
        &self.rooms
    }

    #[must_use]
    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }
}
