//! Client-side state stores.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each store owns one slice of client state behind a `std::sync::Mutex` and
//! talks to the backend through a shared [`crate::net::api::ChatApi`]. The
//! lock is never held across an `.await`: an operation snapshots what it
//! needs, awaits one call, then applies the result in a short critical
//! section.

pub mod conversation;
pub mod inbox;
pub mod rooms;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use conversation::{ConversationState, ConversationStore, Delivery, FetchStatus};
pub use inbox::{Conversation, Inbox};
pub use rooms::{RoomState, RoomStore};
pub use session::{SessionState, SessionStore};
