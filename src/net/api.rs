//! REST binding surface for the chat backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Stores depend on the [`ChatApi`] trait only, so they can be driven by the
//! reqwest-backed [`crate::net::http::HttpChatApi`] in production and by
//! mocks in tests. The endpoint helpers here fix the path for every
//! operation; query parameters are shaped by the transport.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::fmt::Write as _;

use super::types::{
    Ack, CreateInviteRequest, CreateRoomRequest, InvitationLink, InviteJoinResponse, JoinInviteRequest, LoginRequest,
    LoginResponse, Message, RegisterRequest, Room, RoomMessageRequest, SendMessageRequest, User,
};
use crate::error::ApiError;

/// Async binding for every backend operation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ChatApi: Send + Sync {
    /// Install or drop the bearer credential sent with later requests.
    fn set_bearer_token(&self, token: Option<String>) {
        let _ = token;
    }

    // --- auth ---

    async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError>;
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn logout(&self, username: &str) -> Result<Ack, ApiError>;

    // --- users ---

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn list_online_users(&self) -> Result<Vec<User>, ApiError>;
    async fn user_profile(&self, username: &str) -> Result<User, ApiError>;

    // --- private messages ---

    async fn private_history(&self, username: &str, other_user: &str, limit: u32) -> Result<Vec<Message>, ApiError>;
    async fn unread_messages(&self, username: &str) -> Result<Vec<Message>, ApiError>;
    async fn send_message(&self, username: &str, req: &SendMessageRequest) -> Result<Message, ApiError>;
    async fn mark_read(&self, message_id: &str) -> Result<Ack, ApiError>;

    // --- rooms ---

    async fn create_room(&self, username: &str, req: &CreateRoomRequest) -> Result<Room, ApiError>;
    async fn list_rooms(&self) -> Result<Vec<Room>, ApiError>;
    async fn user_rooms(&self, username: &str) -> Result<Vec<Room>, ApiError>;
    async fn join_room(&self, room_id: &str, username: &str) -> Result<Ack, ApiError>;
    async fn leave_room(&self, room_id: &str, username: &str) -> Result<Ack, ApiError>;
    async fn room_history(&self, room_id: &str, limit: u32) -> Result<Vec<Message>, ApiError>;
    async fn send_room_message(&self, room_id: &str, req: &RoomMessageRequest) -> Result<Message, ApiError>;

    // --- invitations ---

    async fn validate_invite(&self, invite_code: &str) -> Result<InvitationLink, ApiError>;
    async fn join_via_invite(&self, req: &JoinInviteRequest) -> Result<InviteJoinResponse, ApiError>;
    async fn create_invite(
        &self,
        room_id: &str,
        username: &str,
        req: &CreateInviteRequest,
    ) -> Result<InvitationLink, ApiError>;
    async fn list_invites(&self, room_id: &str, username: &str) -> Result<Vec<InvitationLink>, ApiError>;
    async fn disable_invite(&self, room_id: &str, invite_code: &str, username: &str) -> Result<Ack, ApiError>;
}

// =============================================================================
// ENDPOINT PATHS
// =============================================================================

pub(crate) const REGISTER_PATH: &str = "/auth/register";
pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const LOGOUT_PATH: &str = "/auth/logout";
pub(crate) const USERS_PATH: &str = "/users";
pub(crate) const ONLINE_USERS_PATH: &str = "/users/online";
pub(crate) const SEND_MESSAGE_PATH: &str = "/messages/send";
pub(crate) const ROOMS_PATH: &str = "/rooms";
pub(crate) const VALIDATE_INVITE_PATH: &str = "/rooms/invite/validate";
pub(crate) const JOIN_INVITE_PATH: &str = "/rooms/invite/join";

pub(crate) fn user_profile_endpoint(username: &str) -> String {
    format!("/users/{}", encode_segment(username))
}

pub(crate) fn private_history_endpoint(username: &str) -> String {
    format!("/messages/private/{}", encode_segment(username))
}

pub(crate) fn unread_endpoint(username: &str) -> String {
    format!("/messages/unread/{}", encode_segment(username))
}

pub(crate) fn mark_read_endpoint(message_id: &str) -> String {
    format!("/messages/mark-read/{}", encode_segment(message_id))
}

pub(crate) fn user_rooms_endpoint(username: &str) -> String {
    format!("/rooms/user/{}", encode_segment(username))
}

pub(crate) fn join_room_endpoint(room_id: &str) -> String {
    format!("/rooms/{}/join", encode_segment(room_id))
}

pub(crate) fn leave_room_endpoint(room_id: &str) -> String {
    format!("/rooms/{}/leave", encode_segment(room_id))
}

pub(crate) fn room_messages_endpoint(room_id: &str) -> String {
    format!("/rooms/{}/messages", encode_segment(room_id))
}

pub(crate) fn create_invite_endpoint(room_id: &str) -> String {
    format!("/rooms/{}/invite", encode_segment(room_id))
}

pub(crate) fn list_invites_endpoint(room_id: &str) -> String {
    format!("/rooms/{}/invites", encode_segment(room_id))
}

pub(crate) fn disable_invite_endpoint(room_id: &str, invite_code: &str) -> String {
    format!("/rooms/{}/invites/{}/disable", encode_segment(room_id), encode_segment(invite_code))
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub(crate) fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
