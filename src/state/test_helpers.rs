//! Scriptable [`ChatApi`] double shared by store, guard, and context tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::error::ApiError;
use crate::net::api::ChatApi;
use crate::net::types::{
    Ack, CreateInviteRequest, CreateRoomRequest, InvitationLink, InviteJoinResponse, JoinInviteRequest, LoginRequest,
    LoginResponse, Message, RegisterRequest, Room, RoomMessageRequest, SendMessageRequest, User,
};

/// Replies are queued per operation name and consumed in call order.
/// A gated call takes its reply immediately but waits for the gate before
/// returning it.
#[derive(Default)]
pub struct MockApi {
    responses: Mutex<HashMap<&'static str, VecDeque<Result<Value, ApiError>>>>,
    gates: Mutex<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    /// Each call with the bearer token installed when it was made.
    calls: Mutex<Vec<(String, Option<String>)>>,
    bearer: Mutex<Option<String>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, op: &'static str, value: Value) {
        self.responses.lock().unwrap().entry(op).or_default().push_back(Ok(value));
    }

    pub fn fail(&self, op: &'static str, err: ApiError) {
        self.responses.lock().unwrap().entry(op).or_default().push_back(Err(err));
    }

    /// Hold the next `op` call until the returned sender fires.
    pub fn gate(&self, op: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().entry(op).or_default().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(call, _)| call.clone()).collect()
    }

    pub fn calls_with_bearer(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bearer(&self) -> Option<String> {
        self.bearer.lock().unwrap().clone()
    }

    async fn reply<T: DeserializeOwned>(&self, op: &'static str, call: String) -> Result<T, ApiError> {
        let bearer = self.bearer();
        self.calls.lock().unwrap().push((call, bearer));
        let next = self.responses.lock().unwrap().get_mut(op).and_then(VecDeque::pop_front);
        let gate = self.gates.lock().unwrap().get_mut(op).and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match next {
            Some(Ok(value)) => serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string())),
            Some(Err(e)) => Err(e),
            None => Err(ApiError::Transport(format!("no scripted reply for {op}"))),
        }
    }
}

pub fn login_json(token: &str, username: &str) -> Value {
    json!({"access_token": token, "token_type": "bearer", "user": {"_id": format!("id-{username}"), "username": username}})
}

pub fn message_json(id: u64, sender: &str, recipient: &str, content: &str) -> Value {
    json!({
        "_id": id.to_string(),
        "sender": sender,
        "recipient": recipient,
        "content": content,
        "message_type": "TEXT",
        "is_read": false,
        "timestamp": "2024-05-01T10:00:00"
    })
}

pub fn direct_message(id: &str, sender: &str, recipient: &str) -> Message {
    Message {
        id: Some(id.to_owned()),
        sender: sender.to_owned(),
        recipient: Some(recipient.to_owned()),
        content: format!("{sender} -> {recipient}"),
        ..Message::default()
    }
}

pub fn room_message(id: &str, sender: &str, room_id: &str) -> Message {
    Message {
        id: Some(id.to_owned()),
        sender: sender.to_owned(),
        room_id: Some(room_id.to_owned()),
        content: format!("{sender} @ {room_id}"),
        ..Message::default()
    }
}

pub fn network_down() -> ApiError {
    ApiError::Transport("connection refused".to_owned())
}

#[async_trait::async_trait]
impl ChatApi for MockApi {
    fn set_bearer_token(&self, token: Option<String>) {
        *self.bearer.lock().unwrap() = token;
    }

    async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError> {
        self.reply("register", format!("register {}", req.username)).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.reply("login", format!("login {}", req.username)).await
    }

    async fn logout(&self, username: &str) -> Result<Ack, ApiError> {
        self.reply("logout", format!("logout {username}")).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.reply("list_users", "list_users".to_owned()).await
    }

    async fn list_online_users(&self) -> Result<Vec<User>, ApiError> {
        self.reply("list_online_users", "list_online_users".to_owned()).await
    }

    async fn user_profile(&self, username: &str) -> Result<User, ApiError> {
        self.reply("user_profile", format!("user_profile {username}")).await
    }

    async fn private_history(&self, username: &str, other_user: &str, limit: u32) -> Result<Vec<Message>, ApiError> {
        self.reply("private_history", format!("private_history {username} {other_user} {limit}")).await
    }

    async fn unread_messages(&self, username: &str) -> Result<Vec<Message>, ApiError> {
        self.reply("unread_messages", format!("unread_messages {username}")).await
    }

    async fn send_message(&self, username: &str, req: &SendMessageRequest) -> Result<Message, ApiError> {
        self.reply("send_message", format!("send_message {username} {} {}", req.recipient, req.content)).await
    }

    async fn mark_read(&self, message_id: &str) -> Result<Ack, ApiError> {
        self.reply("mark_read", format!("mark_read {message_id}")).await
    }

    async fn create_room(&self, username: &str, req: &CreateRoomRequest) -> Result<Room, ApiError> {
        self.reply("create_room", format!("create_room {username} {}", req.room_name)).await
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, ApiError> {
        self.reply("list_rooms", "list_rooms".to_owned()).await
    }

    async fn user_rooms(&self, username: &str) -> Result<Vec<Room>, ApiError> {
        self.reply("user_rooms", format!("user_rooms {username}")).await
    }

    async fn join_room(&self, room_id: &str, username: &str) -> Result<Ack, ApiError> {
        self.reply("join_room", format!("join_room {room_id} {username}")).await
    }

    async fn leave_room(&self, room_id: &str, username: &str) -> Result<Ack, ApiError> {
        self.reply("leave_room", format!("leave_room {room_id} {username}")).await
    }

    async fn room_history(&self, room_id: &str, limit: u32) -> Result<Vec<Message>, ApiError> {
        self.reply("room_history", format!("room_history {room_id} {limit}")).await
    }

    async fn send_room_message(&self, room_id: &str, req: &RoomMessageRequest) -> Result<Message, ApiError> {
        self.reply("send_room_message", format!("send_room_message {room_id} {} {}", req.sender, req.content)).await
    }

    async fn validate_invite(&self, invite_code: &str) -> Result<InvitationLink, ApiError> {
        self.reply("validate_invite", format!("validate_invite {invite_code}")).await
    }

    async fn join_via_invite(&self, req: &JoinInviteRequest) -> Result<InviteJoinResponse, ApiError> {
        self.reply("join_via_invite", format!("join_via_invite {} {}", req.invite_code, req.username)).await
    }

    async fn create_invite(
        &self,
        room_id: &str,
        username: &str,
        req: &CreateInviteRequest,
    ) -> Result<InvitationLink, ApiError> {
        self.reply("create_invite", format!("create_invite {room_id} {username} {}", req.expires_in_hours)).await
    }

    async fn list_invites(&self, room_id: &str, username: &str) -> Result<Vec<InvitationLink>, ApiError> {
        self.reply("list_invites", format!("list_invites {room_id} {username}")).await
    }

    async fn disable_invite(&self, room_id: &str, invite_code: &str, username: &str) -> Result<Ack, ApiError> {
        self.reply("disable_invite", format!("disable_invite {room_id} {invite_code} {username}")).await
    }
}
