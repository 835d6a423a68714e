//! reqwest-backed implementation of [`ChatApi`].
//!
//! ARCHITECTURE
//! ============
//! One shared `reqwest::Client` with request/connect timeouts from config.
//! Every call goes through [`HttpChatApi::send`], which attaches the bearer
//! token, reads the body once, and maps failures into [`ApiError`]. Nothing
//! is retried.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::api::{self, ChatApi};
use super::types::{
    Ack, CreateInviteRequest, CreateRoomRequest, InvitationLink, InviteJoinResponse, JoinInviteRequest, LoginRequest,
    LoginResponse, Message, RegisterRequest, Room, RoomMessageRequest, SendMessageRequest, User,
};
use crate::config::{ClientConfig, Timeouts, normalize_base_url};
use crate::error::ApiError;

pub struct HttpChatApi {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpChatApi {
    /// Build a client rooted at `base_url` (including any `/api` prefix).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] for a malformed base URL or if the
    /// underlying HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(base_url).map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, token: RwLock::new(None) })
    }

    /// Build a client from parsed config.
    ///
    /// # Errors
    ///
    /// See [`HttpChatApi::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner).clone();
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "request failed before response");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        tracing::debug!(%method, path, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path);
        self.send(Method::GET, path, builder).await
    }
}

#[async_trait::async_trait]
impl ChatApi for HttpChatApi {
    fn set_bearer_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError> {
        let builder = self.request(Method::POST, api::REGISTER_PATH).json(req);
        self.send(Method::POST, api::REGISTER_PATH, builder).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let builder = self.request(Method::POST, api::LOGIN_PATH).json(req);
        self.send(Method::POST, api::LOGIN_PATH, builder).await
    }

    async fn logout(&self, username: &str) -> Result<Ack, ApiError> {
        let builder = self
            .request(Method::POST, api::LOGOUT_PATH)
            .query(&[("username", username)]);
        self.send(Method::POST, api::LOGOUT_PATH, builder).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get(api::USERS_PATH).await
    }

    async fn list_online_users(&self) -> Result<Vec<User>, ApiError> {
        self.get(api::ONLINE_USERS_PATH).await
    }

    async fn user_profile(&self, username: &str) -> Result<User, ApiError> {
        self.get(&api::user_profile_endpoint(username)).await
    }

    async fn private_history(&self, username: &str, other_user: &str, limit: u32) -> Result<Vec<Message>, ApiError> {
        let path = api::private_history_endpoint(username);
        let builder = self
            .request(Method::GET, &path)
            .query(&[("other_user", other_user.to_owned()), ("limit", limit.to_string())]);
        self.send(Method::GET, &path, builder).await
    }

    async fn unread_messages(&self, username: &str) -> Result<Vec<Message>, ApiError> {
        self.get(&api::unread_endpoint(username)).await
    }

    async fn send_message(&self, username: &str, req: &SendMessageRequest) -> Result<Message, ApiError> {
        let builder = self
            .request(Method::POST, api::SEND_MESSAGE_PATH)
            .query(&[("username", username)])
            .json(req);
        self.send(Method::POST, api::SEND_MESSAGE_PATH, builder).await
    }

    async fn mark_read(&self, message_id: &str) -> Result<Ack, ApiError> {
        let path = api::mark_read_endpoint(message_id);
        let builder = self.request(Method::PUT, &path);
        self.send(Method::PUT, &path, builder).await
    }

    async fn create_room(&self, username: &str, req: &CreateRoomRequest) -> Result<Room, ApiError> {
        let builder = self
            .request(Method::POST, api::ROOMS_PATH)
            .query(&[("username", username)])
            .json(req);
        self.send(Method::POST, api::ROOMS_PATH, builder).await
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, ApiError> {
        self.get(api::ROOMS_PATH).await
    }

    async fn user_rooms(&self, username: &str) -> Result<Vec<Room>, ApiError> {
        self.get(&api::user_rooms_endpoint(username)).await
    }

    async fn join_room(&self, room_id: &str, username: &str) -> Result<Ack, ApiError> {
        let path = api::join_room_endpoint(room_id);
        let builder = self
            .request(Method::POST, &path)
            .query(&[("username", username)]);
        self.send(Method::POST, &path, builder).await
    }

    async fn leave_room(&self, room_id: &str, username: &str) -> Result<Ack, ApiError> {
        let path = api::leave_room_endpoint(room_id);
        let builder = self
            .request(Method::POST, &path)
            .query(&[("username", username)]);
        self.send(Method::POST, &path, builder).await
    }

    async fn room_history(&self, room_id: &str, limit: u32) -> Result<Vec<Message>, ApiError> {
        let path = api::room_messages_endpoint(room_id);
        let builder = self
            .request(Method::GET, &path)
            .query(&[("limit", limit)]);
        self.send(Method::GET, &path, builder).await
    }

    async fn send_room_message(&self, room_id: &str, req: &RoomMessageRequest) -> Result<Message, ApiError> {
        let path = api::room_messages_endpoint(room_id);
        let builder = self.request(Method::POST, &path).json(req);
        self.send(Method::POST, &path, builder).await
    }

    async fn validate_invite(&self, invite_code: &str) -> Result<InvitationLink, ApiError> {
        let builder = self
            .request(Method::POST, api::VALIDATE_INVITE_PATH)
            .query(&[("invite_code", invite_code)]);
        self.send(Method::POST, api::VALIDATE_INVITE_PATH, builder).await
    }

    async fn join_via_invite(&self, req: &JoinInviteRequest) -> Result<InviteJoinResponse, ApiError> {
        let builder = self.request(Method::POST, api::JOIN_INVITE_PATH).json(req);
        self.send(Method::POST, api::JOIN_INVITE_PATH, builder).await
    }

    async fn create_invite(
        &self,
        room_id: &str,
        username: &str,
        req: &CreateInviteRequest,
    ) -> Result<InvitationLink, ApiError> {
        let path = api::create_invite_endpoint(room_id);
        let builder = self
            .request(Method::POST, &path)
            .query(&[("username", username)])
            .json(req);
        self.send(Method::POST, &path, builder).await
    }

    async fn list_invites(&self, room_id: &str, username: &str) -> Result<Vec<InvitationLink>, ApiError> {
        let path = api::list_invites_endpoint(room_id);
        let builder = self
            .request(Method::GET, &path)
            .query(&[("username", username)]);
        self.send(Method::GET, &path, builder).await
    }

    async fn disable_invite(&self, room_id: &str, invite_code: &str, username: &str) -> Result<Ack, ApiError> {
        let path = api::disable_invite_endpoint(room_id, invite_code);
        let builder = self
            .request(Method::POST, &path)
            .query(&[("username", username)]);
        self.send(Method::POST, &path, builder).await
    }
}
