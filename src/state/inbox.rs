//! Unread-message index grouped by conversation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pushed messages that do not belong to the displayed conversation land
//! here instead of being dropped. The view filter lives in the conversation
//! store; this module only answers "what is unread, and where".

#[cfg(test)]
#[path = "inbox_test.rs"]
mod inbox_test;

use std::collections::HashMap;
use std::fmt;

use crate::net::types::Message;

/// A thread the user can have open: a private chat or a room.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Conversation {
    /// Private chat with the named peer.
    Direct(String),
    /// Room chat keyed by room id.
    Room(String),
}

impl Conversation {
    /// Conversation a message belongs to, seen from `me`.
    ///
    /// Room messages map to their room. For private messages the peer is the
    /// recipient when `me` sent it, otherwise the sender. Without a known
    /// `me`, the sender is used.
    #[must_use]
    pub fn of(message: &Message, me: Option<&str>) -> Self {
        if let Some(room_id) = &message.room_id {
            return Self::Room(room_id.clone());
        }
        match (me, &message.recipient) {
            (Some(me), Some(recipient)) if message.sender == me => Self::Direct(recipient.clone()),
            _ => Self::Direct(message.sender.clone()),
        }
    }

    /// Whether `message` belongs in this conversation's visible thread.
    #[must_use]
    pub fn contains(&self, message: &Message) -> bool {
        match self {
            Self::Direct(peer) => {
                message.room_id.is_none()
                    && (message.sender == *peer || message.recipient.as_deref() == Some(peer.as_str()))
            }
            Self::Room(room_id) => message.room_id.as_deref() == Some(room_id.as_str()),
        }
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(peer) => write!(f, "@{peer}"),
            Self::Room(room_id) => write!(f, "#{room_id}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inbox {
    buckets: HashMap<Conversation, Vec<Message>>,
}

impl Inbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File `message` under `conversation`.
    pub fn record(&mut self, conversation: Conversation, message: Message) {
        self.buckets.entry(conversation).or_default().push(message);
    }

    /// Rebuild from a server unread snapshot.
    pub fn replace_all(&mut self, messages: Vec<Message>, me: Option<&str>) {
        self.buckets.clear();
        for message in messages {
            let conversation = Conversation::of(&message, me);
            self.record(conversation, message);
        }
    }

    /// Drop and return everything unread in `conversation`.
    pub fn take(&mut self, conversation: &Conversation) -> Vec<Message> {
        self.buckets.remove(conversation).unwrap_or_default()
    }

    /// Drop one message by id. Returns whether it was present.
    pub fn remove_message(&mut self, message_id: &str) -> bool {
        let mut found = false;
        self.buckets.retain(|_, messages| {
            let before = messages.len();
            messages.retain(|m| m.id.as_deref() != Some(message_id));
            found |= messages.len() != before;
            !messages.is_empty()
        });
        found
    }

    #[must_use]
    pub fn unread_count(&self, conversation: &Conversation) -> usize {
        self.buckets.get(conversation).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn total_unread(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Conversations with unread messages, sorted for stable output.
    #[must_use]
    pub fn conversations(&self) -> Vec<(Conversation, usize)> {
        let mut out: Vec<_> = self.buckets.iter().map(|(c, m)| (c.clone(), m.len())).collect();
        out.sort();
        out
    }
}
