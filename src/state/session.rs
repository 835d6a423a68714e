//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by the navigation guard and identity-aware callers to coordinate
//! login redirects. The session is authenticated only when both the token and
//! the user are present.
//!
//! TRADE-OFFS
//! ==========
//! Logins are tagged with a monotonic sequence number taken under the state
//! lock. A completion applies only while its tag is still the latest, so an
//! overtaken login (by a newer login, a logout, or a clear) never overwrites
//! the session. Logout clears local state before notifying the backend and
//! never fails. The notification is still sent with the session's token; the
//! transport drops it afterwards unless a newer login has replaced it.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{StorageError, StoreError};
use crate::i18n::{Locale, Text};
use crate::net::api::ChatApi;
use crate::net::types::{LoginRequest, LoginResponse, RegisterRequest, User};
use crate::storage::{self, BlobStore};

/// Blob-store key holding the raw access token.
pub const TOKEN_KEY: &str = "token";
/// Blob-store key holding the JSON-serialized user.
pub const USER_KEY: &str = "user";

/// Point-in-time copy of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
    /// Localized message from the last failed register/login.
    pub error: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

#[derive(Debug, Default)]
struct Inner {
    session: SessionState,
    /// Tag of the most recently issued login; bumped by logout/clear too.
    login_seq: u64,
    /// Register calls currently in flight.
    registering: u32,
}

pub struct SessionStore {
    api: Arc<dyn ChatApi>,
    storage: Arc<dyn BlobStore>,
    locale: Locale,
    inner: Mutex<Inner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, storage: Arc<dyn BlobStore>, locale: Locale) -> Self {
        Self { api, storage, locale, inner: Mutex::new(Inner::default()) }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- reads ---

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner().session.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner().session.is_authenticated()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner().session.token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner().session.user.clone()
    }

    /// Username of the signed-in user, if authenticated.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        let inner = self.inner();
        if !inner.session.is_authenticated() {
            return None;
        }
        inner.session.user.as_ref().map(|u| u.username.clone())
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner().session.loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner().session.error.clone()
    }

    // --- operations ---

    /// Create an account. Registration does not sign the user in.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] whose message is the server detail or the
    /// localized registration fallback.
    pub async fn register(&self, username: &str, password: &str, email: Option<&str>) -> Result<User, StoreError> {
        {
            let mut inner = self.inner();
            inner.registering += 1;
            inner.session.loading = true;
            inner.session.error = None;
        }

        let req = RegisterRequest {
            username: username.to_owned(),
            password: password.to_owned(),
            email: email.filter(|e| !e.trim().is_empty()).map(ToOwned::to_owned),
        };
        let result = self.api.register(&req).await;

        let mut inner = self.inner();
        inner.registering = inner.registering.saturating_sub(1);
        inner.session.loading = inner.registering > 0;
        match result {
            Ok(user) => {
                tracing::info!(username = %user.username, "registered");
                Ok(user)
            }
            Err(e) => {
                let err = StoreError::with_fallback(e, self.locale.text(Text::RegisterFailed));
                tracing::warn!(username, error = %err.api_error(), "registration failed");
                inner.session.error = Some(err.message().to_owned());
                Err(err)
            }
        }
    }

    /// Sign in and persist the session.
    ///
    /// A completion overtaken by a newer login, a logout, or a clear is
    /// returned to its caller but not applied.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] whose message is the server detail or the
    /// localized login fallback. The prior session is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, StoreError> {
        let ticket = {
            let mut inner = self.inner();
            inner.login_seq += 1;
            inner.session.loading = true;
            inner.session.error = None;
            inner.login_seq
        };

        let req = LoginRequest { username: username.to_owned(), password: password.to_owned() };
        let result = self.api.login(&req).await;

        let mut inner = self.inner();
        let current = inner.login_seq == ticket;
        if current {
            inner.session.loading = inner.registering > 0;
        }

        match result {
            Ok(resp) => {
                if !current {
                    tracing::debug!(username, ticket, "discarding stale login completion");
                    return Ok(resp);
                }
                inner.session.token = Some(resp.access_token.clone());
                inner.session.user = Some(resp.user.clone());
                self.api.set_bearer_token(Some(resp.access_token.clone()));
                if let Err(e) = self.persist(&resp.access_token, &resp.user) {
                    tracing::warn!(error = %e, "failed to persist session; continuing in memory");
                }
                tracing::info!(username = %resp.user.username, "logged in");
                Ok(resp)
            }
            Err(e) => {
                let err = StoreError::with_fallback(e, self.locale.text(Text::LoginFailed));
                tracing::warn!(username, error = %err.api_error(), "login failed");
                if current {
                    inner.session.error = Some(err.message().to_owned());
                }
                Err(err)
            }
        }
    }

    /// Sign out. Local state is always cleared; the backend notification is
    /// best-effort and its failure is only logged.
    ///
    /// The notification still carries the session's bearer token. The
    /// transport token is dropped once it resolves, unless a newer login
    /// installed its own meanwhile.
    pub async fn logout(&self) {
        let (user, ticket) = {
            let mut inner = self.inner();
            let user = inner.session.user.take();
            self.reset_locked(&mut inner);
            (user, inner.login_seq)
        };

        let Some(user) = user else {
            self.api.set_bearer_token(None);
            return;
        };
        match self.api.logout(&user.username).await {
            Ok(_) => tracing::info!(username = %user.username, "logged out"),
            Err(e) => tracing::warn!(username = %user.username, error = %e, "logout notification failed"),
        }

        let inner = self.inner();
        if inner.login_seq == ticket {
            self.api.set_bearer_token(None);
        } else {
            tracing::debug!(ticket, "newer login during logout; keeping its token");
        }
    }

    /// Drop the session locally without contacting the backend.
    pub fn clear(&self) {
        let mut inner = self.inner();
        self.reset_locked(&mut inner);
        self.api.set_bearer_token(None);
    }

    /// Restore the session from the blob store.
    ///
    /// Both entries must be present and the user must parse; anything else is
    /// treated as signed out and left as is. Returns whether a session was
    /// restored.
    pub fn load_from_storage(&self) -> bool {
        let token = self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty());
        let user = storage::load_json::<User>(self.storage.as_ref(), USER_KEY);
        let (Some(token), Some(user)) = (token, user) else {
            tracing::debug!("no complete stored session");
            return false;
        };

        let mut inner = self.inner();
        inner.session.token = Some(token.clone());
        inner.session.user = Some(user);
        self.api.set_bearer_token(Some(token));
        true
    }

    fn reset_locked(&self, inner: &mut Inner) {
        inner.login_seq += 1;
        inner.session.token = None;
        inner.session.user = None;
        inner.session.loading = inner.registering > 0;
        inner.session.error = None;
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear stored session entry");
            }
        }
    }

    fn persist(&self, token: &str, user: &User) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, token)?;
        storage::save_json(self.storage.as_ref(), USER_KEY, user)
    }
}
