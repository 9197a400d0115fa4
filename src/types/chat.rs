//! Chat and user snapshots
//!
//! These are read-only snapshots delivered by the chat-list collaborator. The
//! session layer selects one chat as active but never mutates them.

use serde::{Deserialize, Serialize};

use super::identifiers::{ChatId, UserId};

/// Label used when a direct chat has no other participant
pub const FALLBACK_CHAT_NAME: &str = "Chat";

/// Chat participant, stored by value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant user id
    #[serde(rename = "userId", deserialize_with = "UserId::deserialize_lenient")]
    pub user_id: UserId,
    /// Participant username
    #[serde(default)]
    pub username: String,
}

impl Participant {
    /// Create a participant
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

/// Chat snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat id
    pub id: ChatId,
    /// Whether this is a group chat
    #[serde(default)]
    pub is_group: bool,
    /// Group name; direct chats usually have none
    #[serde(default)]
    pub name: Option<String>,
    /// Participants, in server order
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Chat {
    /// Create a direct chat between the given participants
    #[must_use]
    pub fn direct(id: impl Into<ChatId>, participants: Vec<Participant>) -> Self {
        Self {
            id: id.into(),
            is_group: false,
            name: None,
            participants,
        }
    }

    /// Create a named group chat
    #[must_use]
    pub fn group(
        id: impl Into<ChatId>,
        name: impl Into<String>,
        participants: Vec<Participant>,
    ) -> Self {
        Self {
            id: id.into(),
            is_group: true,
            name: Some(name.into()),
            participants,
        }
    }

    /// Name shown in the chat list for the user `me`
    #[must_use]
    pub fn display_name(&self, me: UserId) -> String {
        if self.is_group
            && let Some(name) = self.name.as_deref()
            && !name.trim().is_empty()
        {
            return name.to_string();
        }

        self.participants
            .iter()
            .find(|p| p.user_id != me)
            .map_or_else(|| FALLBACK_CHAT_NAME.to_string(), |p| p.username.clone())
    }

    /// The other side of a direct chat; `None` for groups
    #[must_use]
    pub fn other_user_id(&self, me: UserId) -> Option<UserId> {
        if self.is_group {
            return None;
        }
        self.participants
            .iter()
            .find(|p| p.user_id != me)
            .map(|p| p.user_id)
    }

    /// Look up a participant by user id
    #[must_use]
    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }
}

/// User entry returned by the live search stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Username
    #[serde(default)]
    pub username: String,
}

/// Presence marker shown next to a chat in the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMarker {
    /// Group chat, presence not applicable
    Group,
    /// The other participant is online
    Online,
    /// The other participant is offline
    Offline,
}

/// One row of the chat list projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListEntry {
    /// Chat id
    pub chat_id: ChatId,
    /// Display label
    pub label: String,
    /// Presence marker
    pub marker: ChatMarker,
}
