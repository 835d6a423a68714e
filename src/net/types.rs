//! Wire DTOs for the chat REST backend.
//!
//! DESIGN
//! ======
//! These types mirror the backend's JSON so serde round-trips stay lossless.
//! The backend names identifiers `_id`; an `id` alias is accepted as well, and
//! message identifiers may arrive as strings or integers.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Presence state reported for a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresenceStatus {
    Online,
    #[default]
    Offline,
    Away,
}

/// A user as returned by the `/users` and `/auth` endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend document identifier.
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    /// Unique login name.
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub status: PresenceStatus,
    /// ISO 8601 timestamp of the last login, if any.
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Minimal user carrying only a username.
    #[must_use]
    pub fn named(username: impl Into<String>) -> Self {
        Self { username: username.into(), ..Self::default() }
    }
}

/// Kind of chat message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    #[default]
    Text,
    File,
    Notification,
    System,
}

/// A private or room chat message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Backend message identifier (string or integer on the wire).
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    pub sender: String,
    /// Recipient username for private messages.
    #[serde(default)]
    pub recipient: Option<String>,
    /// Room identifier for room messages.
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub is_read: bool,
    /// ISO 8601 timestamp assigned by the server.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A chat room.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    pub room_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub invite_link: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
}

/// A shareable room invitation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationLink {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    pub room_id: String,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    pub invite_code: String,
    /// Deep link of the form `realchat://invite/{code}`.
    #[serde(default)]
    pub invite_link: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Response of `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

/// Response of `POST /rooms/invite/join`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteJoinResponse {
    #[serde(default)]
    pub message: String,
    pub room_id: String,
    #[serde(default)]
    pub room_name: Option<String>,
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Serialized as `null` when absent.
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub recipient: String,
    pub message_type: MessageType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoomMessageRequest {
    pub room_id: String,
    pub sender: String,
    pub content: String,
    pub message_type: MessageType,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CreateRoomRequest {
    pub room_name: String,
    pub description: Option<String>,
    pub members: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreateInviteRequest {
    pub expires_in_hours: u32,
}

impl Default for CreateInviteRequest {
    fn default() -> Self {
        Self { expires_in_hours: 24 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinInviteRequest {
    pub invite_code: String,
    pub username: String,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(Some(int.to_string()));
            }
            if let Some(int) = number.as_u64() {
                return Ok(Some(int.to_string()));
            }
            Err(D::Error::custom("expected integer message id"))
        }
        _ => Err(D::Error::custom("expected string or integer message id")),
    }
}
