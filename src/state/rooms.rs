//! Room directory, membership, and invitations.
//!
//! The directory lists are refreshed wholesale and report through
//! [`FetchStatus`]. Membership and invitation calls are critical: failures
//! record a localized message and return a [`StoreError`], leaving the lists
//! as they were.

#[cfg(test)]
#[path = "rooms_test.rs"]
mod rooms_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ApiError, StoreError};
use crate::i18n::{Locale, Text};
use crate::net::api::ChatApi;
use crate::net::types::{
    CreateInviteRequest, CreateRoomRequest, InvitationLink, InviteJoinResponse, JoinInviteRequest, Room,
};
use crate::state::conversation::FetchStatus;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomState {
    /// Every room on the server.
    pub rooms: Vec<Room>,
    /// Rooms the signed-in user belongs to.
    pub my_rooms: Vec<Room>,
    pub rooms_status: FetchStatus,
    pub my_rooms_status: FetchStatus,
    pub error: Option<String>,
}

pub struct RoomStore {
    api: Arc<dyn ChatApi>,
    locale: Locale,
    state: Mutex<RoomState>,
}

impl RoomStore {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, locale: Locale) -> Self {
        Self { api, locale, state: Mutex::new(RoomState::default()) }
    }

    fn state(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> RoomState {
        self.state().clone()
    }

    #[must_use]
    pub fn rooms(&self) -> Vec<Room> {
        self.state().rooms.clone()
    }

    #[must_use]
    pub fn my_rooms(&self) -> Vec<Room> {
        self.state().my_rooms.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    // --- directory ---

    pub async fn load_rooms(&self) -> FetchStatus {
        let result = self.api.list_rooms().await;
        let mut state = self.state();
        state.rooms_status = match result {
            Ok(rooms) => {
                state.rooms = rooms;
                FetchStatus::Loaded
            }
            Err(e) => {
                tracing::warn!(error = %e, "room list refresh failed");
                FetchStatus::Failed(e.to_string())
            }
        };
        state.rooms_status.clone()
    }

    pub async fn load_user_rooms(&self, me: &str) -> FetchStatus {
        let result = self.api.user_rooms(me).await;
        let mut state = self.state();
        state.my_rooms_status = match result {
            Ok(rooms) => {
                state.my_rooms = rooms;
                FetchStatus::Loaded
            }
            Err(e) => {
                tracing::warn!(username = me, error = %e, "user room refresh failed");
                FetchStatus::Failed(e.to_string())
            }
        };
        state.my_rooms_status.clone()
    }

    // --- membership ---

    /// Create a room owned by `me`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn create_room(
        &self,
        me: &str,
        room_name: &str,
        description: Option<&str>,
        members: Vec<String>,
    ) -> Result<Room, StoreError> {
        let req = CreateRoomRequest {
            room_name: room_name.to_owned(),
            description: description.map(ToOwned::to_owned),
            members: if members.is_empty() { None } else { Some(members) },
        };
        let result = self.api.create_room(me, &req).await;
        let room = self.settle(result, "create room")?;

        let mut state = self.state();
        state.rooms.push(room.clone());
        state.my_rooms.push(room.clone());
        tracing::info!(room = %room.room_name, "room created");
        Ok(room)
    }

    /// Join an existing room.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn join_room(&self, room_id: &str, me: &str) -> Result<(), StoreError> {
        let result = self.api.join_room(room_id, me).await;
        self.settle(result, "join room")?;
        self.add_membership(room_id, me);
        Ok(())
    }

    /// Leave a room.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn leave_room(&self, room_id: &str, me: &str) -> Result<(), StoreError> {
        let result = self.api.leave_room(room_id, me).await;
        self.settle(result, "leave room")?;

        let mut state = self.state();
        if let Some(room) = state.rooms.iter_mut().find(|r| r.id.as_deref() == Some(room_id)) {
            room.members.retain(|m| m != me);
        }
        state.my_rooms.retain(|r| r.id.as_deref() != Some(room_id));
        Ok(())
    }

    // --- invitations ---

    /// Create an invitation link for a room `me` belongs to.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn create_invite(
        &self,
        room_id: &str,
        me: &str,
        expires_in_hours: u32,
    ) -> Result<InvitationLink, StoreError> {
        let req = CreateInviteRequest { expires_in_hours };
        let result = self.api.create_invite(room_id, me, &req).await;
        self.settle(result, "create invite")
    }

    /// List the active invitations of a room.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn list_invites(&self, room_id: &str, me: &str) -> Result<Vec<InvitationLink>, StoreError> {
        let result = self.api.list_invites(room_id, me).await;
        self.settle(result, "list invites")
    }

    /// Deactivate an invitation.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn disable_invite(&self, room_id: &str, invite_code: &str, me: &str) -> Result<(), StoreError> {
        let result = self.api.disable_invite(room_id, invite_code, me).await;
        self.settle(result, "disable invite").map(|_| ())
    }

    /// Look up an invitation without joining.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn validate_invite(&self, invite_code: &str) -> Result<InvitationLink, StoreError> {
        let result = self.api.validate_invite(invite_code).await;
        self.settle(result, "validate invite")
    }

    /// Join the room behind an invitation code.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] with the server detail or the localized
    /// fallback.
    pub async fn join_via_invite(&self, invite_code: &str, me: &str) -> Result<InviteJoinResponse, StoreError> {
        let req = JoinInviteRequest { invite_code: invite_code.to_owned(), username: me.to_owned() };
        let result = self.api.join_via_invite(&req).await;
        let joined = self.settle(result, "join via invite")?;
        self.add_membership(&joined.room_id, me);
        Ok(joined)
    }

    /// Forget everything, e.g. after logout.
    pub fn clear(&self) {
        *self.state() = RoomState::default();
    }

    fn add_membership(&self, room_id: &str, me: &str) {
        let mut state = self.state();
        let Some(room) = state.rooms.iter_mut().find(|r| r.id.as_deref() == Some(room_id)) else {
            return;
        };
        if !room.members.iter().any(|m| m == me) {
            room.members.push(me.to_owned());
        }
        let room = room.clone();
        if !state.my_rooms.iter().any(|r| r.id == room.id) {
            state.my_rooms.push(room);
        }
    }

    fn settle<T>(&self, result: Result<T, ApiError>, action: &'static str) -> Result<T, StoreError> {
        let mut state = self.state();
        match result {
            Ok(value) => {
                state.error = None;
                Ok(value)
            }
            Err(e) => {
                let err = StoreError::with_fallback(e, self.locale.text(Text::RoomActionFailed));
                tracing::warn!(action, error = %err.api_error(), "room request failed");
                state.error = Some(err.message().to_owned());
                Err(err)
            }
        }
    }
}
